//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::descriptors::{AnyArc, ServiceDescriptor};
use crate::internal::with_circular_catch;
use crate::registration::Registry;
use crate::traits::{Resolver, ResolverCore};
use crate::{DiError, DiResult, Key, Lifetime};

pub mod context;
pub mod scope;

pub use context::{OwnedResolver, ResolverContext, WeakResolver};
pub use scope::Scope;
pub(crate) use scope::ScopeInner;

/// Service provider for resolving dependencies from the DI container.
///
/// Resolves services according to their registered lifetimes and caches
/// singletons. Cloning is cheap: clones share the same singleton cache.
///
/// # Examples
///
/// ```
/// use ferrous_db_factory::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    pub(crate) inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
    // One cell per descriptor slot; only singleton slots are ever filled
    singletons: Box<[Mutex<Option<AnyArc>>]>,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry) -> Self {
        let singletons = (0..registry.len())
            .map(|_| Mutex::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            inner: Arc::new(ProviderInner { registry, singletons }),
        }
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// ```
    /// use ferrous_db_factory::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// struct RequestId(usize);
    ///
    /// let counter = Arc::new(AtomicUsize::new(0));
    /// let c = counter.clone();
    /// let mut collection = ServiceCollection::new();
    /// collection.add_scoped_factory::<RequestId, _>(move |_| RequestId(c.fetch_add(1, Ordering::SeqCst)));
    ///
    /// let provider = collection.build();
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>();
    /// let req2 = scope2.get_required::<RequestId>();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.inner.registry.iter()
    }

    pub(crate) fn resolve_singleton(&self, slot: usize, descriptor: &ServiceDescriptor) -> DiResult<AnyArc> {
        // Held across construction so concurrent first resolutions share one instance
        let mut cell = self.inner.singletons[slot].lock();
        if let Some(value) = cell.as_ref() {
            return Ok(value.clone());
        }

        let ctx = ResolverContext::new(self);
        let value = (descriptor.ctor)(&ctx)?;
        *cell = Some(value.clone());
        Ok(value)
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let Some((slot, descriptor)) = self.inner.registry.get(key) else {
            return Err(DiError::NotFound(key.to_string()));
        };

        trace!(service = %key, lifetime = ?descriptor.lifetime(), "resolving from root provider");
        match descriptor.lifetime() {
            Lifetime::Singleton => self.resolve_singleton(slot, descriptor),
            Lifetime::Scoped => Err(DiError::WrongLifetime("Cannot resolve scoped service from root provider")),
            Lifetime::Transient => {
                let ctx = ResolverContext::new(self);
                (descriptor.ctor)(&ctx)
            }
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        with_circular_catch(key.to_string(), || self.resolve_any_impl(key))
    }

    fn downgrade(&self) -> WeakResolver {
        WeakResolver::root(&self.inner)
    }
}

impl Resolver for ServiceProvider {}
