//! Resolver context handed to factory functions, and weak resolver handles.

use std::sync::{Arc, Weak};

use crate::descriptors::AnyArc;
use crate::error::DiResult;
use crate::key::Key;
use crate::traits::{Resolver, ResolverCore};

use super::{ProviderInner, Scope, ScopeInner, ServiceProvider};

/// Context passed to factory functions for resolving dependencies.
///
/// Wraps the provider or scope performing the resolution, so singleton
/// factories resolve from the root and scoped/transient factories resolve
/// from their scope.
///
/// # Examples
///
/// ```
/// use ferrous_db_factory::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Settings { timeout_secs: u64 }
/// struct Client { settings: Arc<Settings> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Settings { timeout_secs: 30 });
/// services.add_transient_factory::<Client, _>(|resolver| Client {
///     settings: resolver.get_required::<Settings>(),
/// });
///
/// let client = services.build().get_required::<Client>();
/// assert_eq!(client.settings.timeout_secs, 30);
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    /// Creates a new ResolverContext wrapping the given resolver.
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolver.resolve_any(key)
    }

    fn downgrade(&self) -> WeakResolver {
        self.resolver.downgrade()
    }
}

impl Resolver for ResolverContext<'_> {}

/// Non-owning handle to a provider or scope.
///
/// Obtained through [`ResolverCore::downgrade`]. Upgrading fails once the
/// provider or scope has been dropped.
#[derive(Clone)]
pub struct WeakResolver(WeakTarget);

#[derive(Clone)]
enum WeakTarget {
    Root(Weak<ProviderInner>),
    Scope(Weak<ScopeInner>),
}

impl WeakResolver {
    pub(crate) fn root(inner: &Arc<ProviderInner>) -> Self {
        Self(WeakTarget::Root(Arc::downgrade(inner)))
    }

    pub(crate) fn scope(inner: &Arc<ScopeInner>) -> Self {
        Self(WeakTarget::Scope(Arc::downgrade(inner)))
    }

    /// Gets an owning resolver back, if the provider or scope is still alive.
    pub fn upgrade(&self) -> Option<OwnedResolver> {
        match &self.0 {
            WeakTarget::Root(weak) => weak.upgrade().map(|inner| OwnedResolver::Root(ServiceProvider { inner })),
            WeakTarget::Scope(weak) => weak.upgrade().map(|inner| OwnedResolver::Scope(Scope { inner })),
        }
    }
}

impl std::fmt::Debug for WeakResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.0 {
            WeakTarget::Root(_) => "root",
            WeakTarget::Scope(_) => "scope",
        };
        f.debug_tuple("WeakResolver").field(&kind).finish()
    }
}

/// An upgraded [`WeakResolver`].
#[derive(Clone)]
pub enum OwnedResolver {
    Root(ServiceProvider),
    Scope(Scope),
}

impl ResolverCore for OwnedResolver {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match self {
            OwnedResolver::Root(provider) => provider.resolve_any(key),
            OwnedResolver::Scope(scope) => scope.resolve_any(key),
        }
    }

    fn downgrade(&self) -> WeakResolver {
        match self {
            OwnedResolver::Root(provider) => provider.downgrade(),
            OwnedResolver::Scope(scope) => scope.downgrade(),
        }
    }
}

impl Resolver for OwnedResolver {}
