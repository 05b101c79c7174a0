//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, keyed_key_of_trait, keyed_key_of_type, Key};
use crate::provider::WeakResolver;

/// Core resolver trait for object-safe service resolution.
///
/// Handles the low-level mechanics (lifetime caching, circular dependency
/// detection). Most callers use the generic methods on [`Resolver`].
pub trait ResolverCore: Send + Sync {
    /// Resolves the service registered under `key` as a type-erased `Arc`.
    ///
    /// Trait objects come back as `Arc<Arc<dyn Trait>>` behind the `Any`.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Returns a non-owning handle to the provider or scope doing the resolution.
    ///
    /// Services that need to resolve later (connection factories calling a
    /// user construction function) keep this instead of a strong reference,
    /// so a cached service never keeps its own scope alive.
    fn downgrade(&self) -> WeakResolver;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// `ServiceProvider`, `Scope` and the `ResolverContext` handed to factories
/// all implement it.
///
/// # Examples
///
/// ```
/// use ferrous_db_factory::{ServiceCollection, Resolver, Lifetime};
/// use std::sync::Arc;
///
/// trait Dialect: Send + Sync {
///     fn quote(&self, ident: &str) -> String;
/// }
///
/// struct Postgres;
/// impl Dialect for Postgres {
///     fn quote(&self, ident: &str) -> String { format!("\"{}\"", ident) }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(5432u16);
/// collection.add_keyed_trait_factory::<dyn Dialect, _>("pg", Lifetime::Singleton, |_| Arc::new(Postgres));
///
/// let provider = collection.build();
/// assert_eq!(*provider.get_required::<u16>(), 5432);
/// assert_eq!(provider.get_keyed_trait::<dyn Dialect>("pg").unwrap().quote("users"), "\"users\"");
/// assert!(provider.get_keyed_trait::<dyn Dialect>("mysql").is_err());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        downcast_type(self.resolve_any(&key_of_type::<T>())?)
    }

    /// Resolves a trait implementation.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        downcast_trait(self.resolve_any(&key_of_trait::<T>())?)
    }

    /// Resolves a keyed concrete service type.
    fn get_keyed<T: 'static + Send + Sync>(&self, service_key: &str) -> DiResult<Arc<T>> {
        downcast_type(self.resolve_any(&keyed_key_of_type::<T>(service_key))?)
    }

    /// Resolves a keyed trait implementation.
    fn get_keyed_trait<T: ?Sized + 'static + Send + Sync>(&self, service_key: &str) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        downcast_trait(self.resolve_any(&keyed_key_of_trait::<T>(service_key))?)
    }

    /// Resolves a concrete service type, panicking on failure.
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait implementation, panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a keyed concrete service type, panicking on failure.
    fn get_keyed_required<T: 'static + Send + Sync>(&self, service_key: &str) -> Arc<T> {
        self.get_keyed::<T>(service_key).unwrap_or_else(|e| {
            panic!("Failed to resolve keyed {} ({}): {}", std::any::type_name::<T>(), service_key, e)
        })
    }

    /// Resolves a keyed trait implementation, panicking on failure.
    fn get_keyed_trait_required<T: ?Sized + 'static + Send + Sync>(&self, service_key: &str) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_keyed_trait::<T>(service_key).unwrap_or_else(|e| {
            panic!("Failed to resolve keyed trait {} ({}): {}", std::any::type_name::<T>(), service_key, e)
        })
    }
}

fn downcast_type<T: 'static + Send + Sync>(any: Arc<dyn Any + Send + Sync>) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait objects are stored as Arc<Arc<dyn Trait>>
fn downcast_trait<T: ?Sized + 'static + Send + Sync>(any: Arc<dyn Any + Send + Sync>) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
