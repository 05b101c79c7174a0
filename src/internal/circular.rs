//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<String>,
    frozen: bool,
    depth: usize,
}

/// Panic payload for circular dependency detection.
///
/// Carries the dependency path up to the outermost resolution, where it is
/// turned into [`DiError::Circular`].
///
/// Example path: `["dyn DbConnectionFactory", "Pool", "dyn DbConnectionFactory"]`
#[derive(Debug)]
pub struct CircularPanic {
    /// The complete circular dependency path showing the cycle.
    pub path: Box<[String]>,
}

/// Guard for managing the thread-local resolution stack
struct StackGuard {
    outermost: bool,
}

impl StackGuard {
    fn new(name: String) -> Self {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();

            // Circular detection BEFORE pushing the new name
            if tls.stack.iter().any(|n| *n == name) {
                let mut path = tls.stack.clone();
                path.push(name);
                tls.frozen = true; // freeze pops during unwind
                drop(tls);
                panic::panic_any(CircularPanic { path: path.into_boxed_slice() });
            }

            if tls.depth >= MAX_DEPTH {
                let depth = tls.depth;
                tls.frozen = true;
                drop(tls);
                panic::panic_any(DiError::DepthExceeded(depth));
            }

            let outermost = tls.stack.is_empty();
            tls.stack.push(name);
            tls.depth += 1;
            Self { outermost }
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            if !tls.frozen {
                tls.stack.pop();
                tls.depth = tls.depth.saturating_sub(1);
            } else if self.outermost {
                // unwinding finished at the top: reset for the next resolution
                *tls = ResolutionTls::default();
            }
        });
    }
}

/// Execute a closure with circular dependency detection
pub(crate) fn with_circular_catch<T, F>(name: String, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let guard = StackGuard::new(name);
    let outermost = guard.outermost;

    let result = panic::catch_unwind(AssertUnwindSafe(f));
    drop(guard);

    match result {
        Ok(result) => result,
        Err(payload) if outermost => {
            if let Some(circular) = payload.downcast_ref::<CircularPanic>() {
                Err(DiError::Circular(circular.path.to_vec()))
            } else if let Some(DiError::DepthExceeded(depth)) = payload.downcast_ref::<DiError>() {
                Err(DiError::DepthExceeded(*depth))
            } else {
                panic::resume_unwind(payload)
            }
        }
        // inner frames keep unwinding so the outermost resolution reports the full path
        Err(payload) => panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_names_are_popped_after_success() {
        let value = with_circular_catch("A".to_string(), || {
            with_circular_catch("B".to_string(), || Ok(1))
        });
        assert_eq!(value.unwrap(), 1);
        RESOLUTION_TLS.with(|tls| assert!(tls.borrow().stack.is_empty()));
    }

    #[test]
    fn repeated_name_reports_full_path() {
        let result: DiResult<()> = with_circular_catch("A".to_string(), || {
            with_circular_catch("B".to_string(), || with_circular_catch("A".to_string(), || Ok(())))
        });
        match result {
            Err(DiError::Circular(path)) => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("expected circular error, got {:?}", other),
        }
        // state is reset for the next resolution on this thread
        assert!(with_circular_catch("A".to_string(), || Ok(())).is_ok());
    }
}
