//! Service descriptors: the entries a [`ServiceCollection`](crate::ServiceCollection) holds.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, keyed_key_of_trait, keyed_key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::traits::ResolverCore;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// How a descriptor produces its service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Construction {
    /// Builds the object itself
    Factory {
        /// Implementation type name, when known
        impl_type_name: Option<&'static str>,
    },
    /// Resolves another registration through the container
    Delegate {
        /// Key of the registration this one forwards to
        target: Key,
    },
}

/// A single container entry: requested key, lifetime and construction strategy.
///
/// Descriptors are immutable once created. Cloning is cheap; the
/// constructor is shared behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use ferrous_db_factory::{ServiceCollection, ServiceDescriptor, Lifetime, Resolver, key_of_type};
/// use std::sync::Arc;
///
/// struct Settings { retries: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add(ServiceDescriptor::typed::<Settings, _>(Lifetime::Singleton, |_| {
///     Ok(Settings { retries: 3 })
/// }));
/// services.add(ServiceDescriptor::delegate(
///     ferrous_db_factory::keyed_key_of_type::<Settings>("primary"),
///     Lifetime::Singleton,
///     key_of_type::<Settings>(),
/// ));
///
/// let descriptors = services.descriptors();
/// assert!(!descriptors[0].is_delegate());
/// assert!(descriptors[1].is_delegate());
///
/// let provider = services.build();
/// let direct = provider.get_required::<Settings>();
/// let keyed = provider.get_keyed_required::<Settings>("primary");
/// assert!(Arc::ptr_eq(&direct, &keyed));
/// ```
#[derive(Clone)]
pub struct ServiceDescriptor {
    key: Key,
    lifetime: Lifetime,
    construction: Construction,
    pub(crate) ctor: Ctor,
}

impl ServiceDescriptor {
    pub(crate) fn from_ctor(key: Key, lifetime: Lifetime, construction: Construction, ctor: Ctor) -> Self {
        Self { key, lifetime, construction, ctor }
    }

    fn factory_of<T, F>(key: Key, lifetime: Lifetime, factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(r)?)) };
        Self::from_ctor(
            key,
            lifetime,
            Construction::Factory { impl_type_name: Some(std::any::type_name::<T>()) },
            Arc::new(ctor),
        )
    }

    fn trait_factory_of<Trait, F>(key: Key, lifetime: Lifetime, factory: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        // Trait objects are stored as Arc<Arc<dyn Trait>> inside the Any
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(r)?)) };
        Self::from_ctor(key, lifetime, Construction::Factory { impl_type_name: None }, Arc::new(ctor))
    }

    /// Descriptor for a concrete type built by a fallible factory.
    pub fn typed<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::factory_of(key_of_type::<T>(), lifetime, factory)
    }

    /// Keyed descriptor for a concrete type.
    pub fn keyed_typed<T, F>(service_key: &str, lifetime: Lifetime, factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::factory_of(keyed_key_of_type::<T>(service_key), lifetime, factory)
    }

    /// Descriptor for a trait object (`dyn Trait`).
    pub fn trait_object<Trait, F>(lifetime: Lifetime, factory: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        Self::trait_factory_of(key_of_trait::<Trait>(), lifetime, factory)
    }

    /// Keyed descriptor for a trait object.
    pub fn keyed_trait_object<Trait, F>(service_key: &str, lifetime: Lifetime, factory: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> DiResult<Arc<Trait>> + Send + Sync + 'static,
    {
        Self::trait_factory_of(keyed_key_of_trait::<Trait>(service_key), lifetime, factory)
    }

    /// Descriptor that forwards to another registration of the same stored type.
    ///
    /// `key` and `target` must name the same type or the same trait; only the
    /// service key may differ. The resolved instance is the target's instance.
    pub fn delegate(key: Key, lifetime: Lifetime, target: Key) -> Self {
        let forward = target.clone();
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> { r.resolve_any(&forward) };
        Self::from_ctor(key, lifetime, Construction::Delegate { target }, Arc::new(ctor))
    }

    /// Descriptor that resolves the `From` trait object registered under
    /// `target` and exposes it as a `To` trait object.
    ///
    /// `convert` must not allocate a new service; it only changes the view
    /// on the existing one.
    pub fn delegate_trait<From, To>(key: Key, lifetime: Lifetime, target: Key, convert: fn(Arc<From>) -> Arc<To>) -> Self
    where
        From: ?Sized + 'static + Send + Sync,
        To: ?Sized + 'static + Send + Sync,
    {
        let forward = target.clone();
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            let any = r.resolve_any(&forward)?;
            let source = any
                .downcast::<Arc<From>>()
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<From>()))?;
            let view: AnyArc = Arc::new(convert((*source).clone()));
            Ok(view)
        };
        Self::from_ctor(key, lifetime, Construction::Delegate { target }, Arc::new(ctor))
    }

    /// Records the implementation type behind a factory descriptor.
    pub(crate) fn implemented_by<I: ?Sized + 'static>(mut self) -> Self {
        if let Construction::Factory { impl_type_name } = &mut self.construction {
            *impl_type_name = Some(std::any::type_name::<I>());
        }
        self
    }

    /// The key this descriptor is registered under
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    /// Type or trait name of the requested service
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Service key for keyed registrations
    pub fn service_key(&self) -> Option<&str> {
        self.key.service_key()
    }

    pub fn is_keyed(&self) -> bool {
        self.key.is_keyed()
    }

    /// True when this descriptor forwards to another registration
    pub fn is_delegate(&self) -> bool {
        matches!(self.construction, Construction::Delegate { .. })
    }

    /// The forwarded-to key for delegating descriptors
    pub fn delegate_target(&self) -> Option<&Key> {
        match &self.construction {
            Construction::Delegate { target } => Some(target),
            Construction::Factory { .. } => None,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("construction", &self.construction)
            .finish()
    }
}
