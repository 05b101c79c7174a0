//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::sync::Arc;

use tracing::debug;

use crate::descriptors::{AnyArc, Construction, ServiceDescriptor};
use crate::key::{key_of_trait, key_of_type, keyed_key_of_trait, keyed_key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::registration::Registry;
use crate::{DiResult, ServiceProvider};

/// Ordered list of service descriptors, turned into a [`ServiceProvider`] by [`build`](Self::build).
///
/// Registration never fails at this level; extension registrations that
/// validate their arguments (see
/// [`DbConnectionsExt`](crate::database::DbConnectionsExt)) return a
/// `DiResult` instead.
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self { descriptors: Vec::new() }
    }

    // ----- Descriptor Level -----

    /// Appends a descriptor. A later descriptor for the same key wins at resolution time.
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        debug!(
            service = %descriptor.key(),
            lifetime = ?descriptor.lifetime(),
            delegate = descriptor.is_delegate(),
            "adding service descriptor"
        );
        self.descriptors.push(descriptor);
        self
    }

    /// Appends descriptors in iteration order.
    pub fn add_range<I>(&mut self, descriptors: I) -> &mut Self
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        for descriptor in descriptors {
            self.add(descriptor);
        }
        self
    }

    /// Appends the descriptor only if nothing is registered under its key yet.
    ///
    /// ```rust
    /// use ferrous_db_factory::{ServiceCollection, ServiceDescriptor, Lifetime};
    ///
    /// let mut services = ServiceCollection::new();
    /// assert!(services.try_add(ServiceDescriptor::typed::<u32, _>(Lifetime::Singleton, |_| Ok(1))));
    /// assert!(!services.try_add(ServiceDescriptor::typed::<u32, _>(Lifetime::Singleton, |_| Ok(2))));
    /// assert_eq!(services.len(), 1);
    /// ```
    pub fn try_add(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.contains(descriptor.key()) {
            debug!(service = %descriptor.key(), "service already registered, skipping");
            false
        } else {
            self.add(descriptor);
            true
        }
    }

    /// Whether any descriptor is registered under `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.descriptors.iter().any(|d| d.key() == key)
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // ----- Concrete Type Registrations -----

    /// Registers a singleton instance that will be shared across the entire application.
    ///
    /// ```rust
    /// # use ferrous_db_factory::{ServiceCollection, Resolver};
    /// struct Config { pool_size: usize }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config { pool_size: 8 });
    /// assert_eq!(services.build().get_required::<Config>().pool_size, 8);
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        let any_arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(any_arc.clone()) };
        self.add(ServiceDescriptor::from_ctor(
            key_of_type::<T>(),
            Lifetime::Singleton,
            Construction::Factory { impl_type_name: Some(std::any::type_name::<T>()) },
            Arc::new(ctor),
        ))
    }

    /// Registers a singleton factory, invoked once on first resolution.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory that creates one instance per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Scoped, factory)
    }

    /// Registers a transient factory that creates a new instance on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::typed::<T, _>(lifetime, move |r| Ok(factory(r))))
    }

    // ----- Trait Registrations -----

    /// Registers a singleton trait implementation.
    ///
    /// ```rust
    /// # use ferrous_db_factory::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    /// struct Fixed;
    /// impl Clock for Fixed { fn now(&self) -> u64 { 42 } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait(Arc::new(Fixed) as Arc<dyn Clock>);
    /// assert_eq!(services.build().get_required_trait::<dyn Clock>().now(), 42);
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        // Stored as Arc<Arc<dyn Trait>> in Any
        let any_arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(any_arc.clone()) };
        self.add(ServiceDescriptor::from_ctor(
            key_of_trait::<T>(),
            Lifetime::Singleton,
            Construction::Factory { impl_type_name: None },
            Arc::new(ctor),
        ))
    }

    /// Registers a trait factory with the given lifetime.
    pub fn add_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::trait_object::<Trait, _>(lifetime, move |r| Ok(factory(r))))
    }

    // ----- Keyed Registrations -----

    /// Registers a keyed factory for a concrete type.
    ///
    /// ```rust
    /// # use ferrous_db_factory::{ServiceCollection, Resolver, Lifetime};
    /// let mut services = ServiceCollection::new();
    /// services.add_keyed_factory::<String, _>("primary", Lifetime::Singleton, |_| "db-1".to_string());
    /// services.add_keyed_factory::<String, _>("replica", Lifetime::Singleton, |_| "db-2".to_string());
    ///
    /// let provider = services.build();
    /// assert_eq!(&*provider.get_keyed_required::<String>("replica"), "db-2");
    /// ```
    pub fn add_keyed_factory<T, F>(&mut self, service_key: &str, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::keyed_typed::<T, _>(service_key, lifetime, move |r| Ok(factory(r))))
    }

    /// Registers a keyed trait factory.
    pub fn add_keyed_trait_factory<Trait, F>(&mut self, service_key: &str, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::keyed_trait_object::<Trait, _>(service_key, lifetime, move |r| Ok(factory(r))))
    }

    /// Whether a keyed registration exists for `T` under `service_key`.
    pub fn contains_keyed<T: 'static>(&self, service_key: &str) -> bool {
        self.contains(&keyed_key_of_type::<T>(service_key))
    }

    /// Whether a keyed trait registration exists under `service_key`.
    pub fn contains_keyed_trait<T: ?Sized + 'static>(&self, service_key: &str) -> bool {
        self.contains(&keyed_key_of_trait::<T>(service_key))
    }

    /// Builds the service provider from the registered descriptors.
    ///
    /// ```rust
    /// use ferrous_db_factory::{ServiceCollection, Resolver};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton(42usize);
    /// collection.add_transient_factory::<String, _>(|_| "Hello".to_string());
    ///
    /// let provider = collection.build();
    /// assert_eq!(*provider.get_required::<usize>(), 42);
    /// assert_eq!(&*provider.get_required::<String>(), "Hello");
    /// ```
    pub fn build(self) -> ServiceProvider {
        debug!(descriptors = self.descriptors.len(), "building service provider");
        ServiceProvider::new(Registry::new(self.descriptors))
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}
