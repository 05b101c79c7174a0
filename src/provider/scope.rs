//! Scoped service resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::descriptors::{AnyArc, ServiceDescriptor};
use crate::internal::with_circular_catch;
use crate::traits::{Resolver, ResolverCore};
use crate::{DiError, DiResult, Key, Lifetime};

use super::{ResolverContext, ServiceProvider, WeakResolver};

/// Scoped service container for per-unit-of-work resolution.
///
/// - **Singleton**: resolved and cached in the root provider
/// - **Scoped**: resolved and cached within this scope
/// - **Transient**: created fresh on every resolution
///
/// `Scope` is a handle: clones refer to the same scope and share its cache.
///
/// # Examples
///
/// ```
/// use ferrous_db_factory::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Transaction(u32);
/// struct Repository { tx: Arc<Transaction> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_scoped_factory::<Transaction, _>(|_| Transaction(1));
/// collection.add_transient_factory::<Repository, _>(|r| Repository { tx: r.get_required::<Transaction>() });
///
/// let scope = collection.build().create_scope();
/// let users = scope.get_required::<Repository>();
/// let orders = scope.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&users.tx, &orders.tx));
/// ```
#[derive(Clone)]
pub struct Scope {
    pub(crate) inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    root: ServiceProvider,
    scoped: Mutex<HashMap<usize, AnyArc>>,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                root,
                scoped: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The root provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.inner.root
    }

    /// Creates a sibling scope with an empty scoped cache.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.inner.root.clone())
    }

    fn resolve_scoped(&self, slot: usize, descriptor: &ServiceDescriptor) -> DiResult<AnyArc> {
        if let Some(cached) = self.inner.scoped.lock().get(&slot) {
            return Ok(cached.clone());
        }

        // Construct without holding the lock: the factory may resolve other scoped services
        let ctx = ResolverContext::new(self);
        let value = (descriptor.ctor)(&ctx)?;

        let mut scoped = self.inner.scoped.lock();
        Ok(scoped.entry(slot).or_insert(value).clone())
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let Some((slot, descriptor)) = self.inner.root.inner.registry.get(key) else {
            return Err(DiError::NotFound(key.to_string()));
        };

        trace!(service = %key, lifetime = ?descriptor.lifetime(), "resolving from scope");
        match descriptor.lifetime() {
            Lifetime::Singleton => self.inner.root.resolve_singleton(slot, descriptor),
            Lifetime::Scoped => self.resolve_scoped(slot, descriptor),
            Lifetime::Transient => {
                let ctx = ResolverContext::new(self);
                (descriptor.ctor)(&ctx)
            }
        }
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        with_circular_catch(key.to_string(), || self.resolve_any_impl(key))
    }

    fn downgrade(&self) -> WeakResolver {
        WeakResolver::scope(&self.inner)
    }
}

impl Resolver for Scope {}
