//! Registration options: which connection factory facets a registration exposes.
//!
//! A facet is one `(service type, key kind)` combination under which the
//! same factory instance can be resolved:
//!
//! | facet               | resolved as                                   |
//! |---------------------|-----------------------------------------------|
//! | `KeyedTyped`        | `dyn TypedDbConnectionFactory<T>` under a key |
//! | `DefaultTyped`      | `dyn TypedDbConnectionFactory<T>`             |
//! | `KeyedNonGeneric`   | `dyn DbConnectionFactory` under a key         |
//! | `DefaultNonGeneric` | `dyn DbConnectionFactory`                     |
//!
//! The first requested facet in that order is the primary: it owns the
//! factory. Every other requested facet is a delegate that resolves the
//! primary through the container, so within one scope all facets hand out
//! the same factory.

use std::sync::Arc;

use bitflags::bitflags;
use tracing::debug;

use crate::descriptors::ServiceDescriptor;
use crate::key::{key_of_trait, keyed_key_of_trait, Key};
use crate::provider::ResolverContext;
use crate::{DiError, DiResult, Lifetime, ServiceCollection};

use super::connection::{DbConnection, DbConnectionFactory, TypedDbConnectionFactory};
use super::factory::{default_constructor, ConnectionConstructor, NamedConnectionFactory, DEFAULT_CONNECTION_NAME};

bitflags! {
    /// Facets a connection factory registration should expose.
    ///
    /// ```
    /// use ferrous_db_factory::database::RegistrationOptions;
    ///
    /// let options = RegistrationOptions::default();
    /// assert_eq!(options, RegistrationOptions::DEFAULT_BOTH);
    /// assert!(RegistrationOptions::KEYED_AND_DEFAULT_BOTH.contains(options));
    /// assert!(!options.is_keyed());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegistrationOptions: u32 {
        /// `dyn TypedDbConnectionFactory<T>` without a key
        const DEFAULT_TYPED = 1;
        /// `dyn DbConnectionFactory` without a key
        const DEFAULT_NON_GENERIC = 1 << 1;
        /// `dyn TypedDbConnectionFactory<T>` under the connection name
        const KEYED_TYPED = 1 << 2;
        /// `dyn DbConnectionFactory` under the connection name
        const KEYED_NON_GENERIC = 1 << 3;

        const DEFAULT_BOTH = Self::DEFAULT_TYPED.bits() | Self::DEFAULT_NON_GENERIC.bits();
        const KEYED_BOTH = Self::KEYED_TYPED.bits() | Self::KEYED_NON_GENERIC.bits();
        const KEYED_AND_DEFAULT_TYPED = Self::KEYED_TYPED.bits() | Self::DEFAULT_TYPED.bits();
        const KEYED_AND_DEFAULT_BOTH = Self::KEYED_BOTH.bits() | Self::DEFAULT_BOTH.bits();
    }
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self::DEFAULT_BOTH
    }
}

impl RegistrationOptions {
    /// Options used for a registration that names its connection: every
    /// facet when keyed services are available, otherwise the default ones.
    pub const fn for_named() -> Self {
        if cfg!(feature = "keyed") {
            Self::KEYED_AND_DEFAULT_BOTH
        } else {
            Self::DEFAULT_BOTH
        }
    }

    /// Whether any keyed facet is requested
    pub fn is_keyed(&self) -> bool {
        self.intersects(Self::KEYED_BOTH)
    }
}

/// One facet of a connection factory registration, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    KeyedTyped,
    DefaultTyped,
    KeyedNonGeneric,
    DefaultNonGeneric,
}

impl Facet {
    /// All facets, highest priority first
    pub const PRIORITY: [Facet; 4] = [
        Facet::KeyedTyped,
        Facet::DefaultTyped,
        Facet::KeyedNonGeneric,
        Facet::DefaultNonGeneric,
    ];

    /// The option flag selecting this facet
    pub fn option(self) -> RegistrationOptions {
        match self {
            Facet::KeyedTyped => RegistrationOptions::KEYED_TYPED,
            Facet::DefaultTyped => RegistrationOptions::DEFAULT_TYPED,
            Facet::KeyedNonGeneric => RegistrationOptions::KEYED_NON_GENERIC,
            Facet::DefaultNonGeneric => RegistrationOptions::DEFAULT_NON_GENERIC,
        }
    }

    pub fn is_keyed(self) -> bool {
        matches!(self, Facet::KeyedTyped | Facet::KeyedNonGeneric)
    }

    pub fn is_typed(self) -> bool {
        matches!(self, Facet::KeyedTyped | Facet::DefaultTyped)
    }

    /// Container key of this facet for connection type `T`.
    ///
    /// Keyed facets use `service_key`; default facets ignore it.
    pub fn key<T: DbConnection>(self, service_key: &str) -> Key {
        match self {
            Facet::KeyedTyped => keyed_key_of_trait::<dyn TypedDbConnectionFactory<T>>(service_key),
            Facet::DefaultTyped => key_of_trait::<dyn TypedDbConnectionFactory<T>>(),
            Facet::KeyedNonGeneric => keyed_key_of_trait::<dyn DbConnectionFactory>(service_key),
            Facet::DefaultNonGeneric => key_of_trait::<dyn DbConnectionFactory>(),
        }
    }
}

/// Validated set of facets for one registration.
///
/// Built by [`plan`]; holds at least one facet, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPlan {
    facets: Vec<Facet>,
    connection_name: Arc<str>,
}

impl RegistrationPlan {
    /// The facet that owns the factory
    pub fn primary(&self) -> Facet {
        self.facets[0]
    }

    /// Facets that forward to the primary
    pub fn delegates(&self) -> &[Facet] {
        &self.facets[1..]
    }

    /// All facets, primary first
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Connection name the factory is bound to; also the service key of keyed facets.
    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    /// Number of descriptors the plan produces
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Container key of `facet` for connection type `T`
    pub fn key<T: DbConnection>(&self, facet: Facet) -> Key {
        facet.key::<T>(&self.connection_name)
    }

    /// Descriptors for this plan, primary first.
    ///
    /// The primary builds a [`NamedConnectionFactory`] with `create`; each
    /// delegate resolves the primary and, for a non-generic facet over a
    /// typed primary, exposes it through
    /// [`into_untyped`](TypedDbConnectionFactory::into_untyped).
    pub fn descriptors<T: DbConnection>(&self, lifetime: Lifetime, create: ConnectionConstructor<T>) -> Vec<ServiceDescriptor> {
        let primary = self.primary();
        let primary_key = self.key::<T>(primary);

        let mut descriptors = Vec::with_capacity(self.facets.len());
        descriptors.push(primary_descriptor(primary_key.clone(), primary, lifetime, create, self.connection_name.clone()));

        for &facet in self.delegates() {
            let key = self.key::<T>(facet);
            let descriptor = if facet.is_typed() == primary.is_typed() {
                ServiceDescriptor::delegate(key, lifetime, primary_key.clone())
            } else {
                // Only typed primaries can be viewed as non-generic; the
                // priority order never puts a non-generic facet first here
                ServiceDescriptor::delegate_trait::<dyn TypedDbConnectionFactory<T>, dyn DbConnectionFactory>(
                    key,
                    lifetime,
                    primary_key.clone(),
                    |factory: Arc<dyn TypedDbConnectionFactory<T>>| factory.into_untyped(),
                )
            };
            descriptors.push(descriptor);
        }
        descriptors
    }
}

pub(crate) fn primary_descriptor<T: DbConnection>(
    key: Key,
    facet: Facet,
    lifetime: Lifetime,
    create: ConnectionConstructor<T>,
    connection_name: Arc<str>,
) -> ServiceDescriptor {
    let descriptor = if facet.is_typed() {
        typed_factory_descriptor(key, lifetime, create, connection_name)
    } else {
        non_generic_factory_descriptor(key, lifetime, create, connection_name)
    };
    descriptor.implemented_by::<NamedConnectionFactory<T>>()
}

fn typed_factory_descriptor<T: DbConnection>(
    key: Key,
    lifetime: Lifetime,
    create: ConnectionConstructor<T>,
    connection_name: Arc<str>,
) -> ServiceDescriptor {
    let build = move |r: &ResolverContext| -> DiResult<Arc<dyn TypedDbConnectionFactory<T>>> {
        Ok(Arc::new(NamedConnectionFactory::from_context(r, create.clone(), connection_name.clone())?))
    };
    match key.service_key() {
        Some(service_key) => ServiceDescriptor::keyed_trait_object(service_key, lifetime, build),
        None => ServiceDescriptor::trait_object(lifetime, build),
    }
}

fn non_generic_factory_descriptor<T: DbConnection>(
    key: Key,
    lifetime: Lifetime,
    create: ConnectionConstructor<T>,
    connection_name: Arc<str>,
) -> ServiceDescriptor {
    let build = move |r: &ResolverContext| -> DiResult<Arc<dyn DbConnectionFactory>> {
        Ok(Arc::new(NamedConnectionFactory::from_context(r, create.clone(), connection_name.clone())?))
    };
    match key.service_key() {
        Some(service_key) => ServiceDescriptor::keyed_trait_object(service_key, lifetime, build),
        None => ServiceDescriptor::trait_object(lifetime, build),
    }
}

/// Resolves `options` into a registration plan.
///
/// `name` is the connection name; it is required when a keyed facet is
/// requested and defaults to `"Default"` otherwise.
///
/// # Errors
///
/// - [`DiError::InvalidOptions`] when `options` selects no facet, or selects
///   a keyed facet in a build without the `keyed` feature
/// - [`DiError::MissingArgument`] when a keyed facet is requested without a name
///
/// ```
/// use ferrous_db_factory::database::{plan, Facet, RegistrationOptions};
///
/// let registration = plan(RegistrationOptions::DEFAULT_BOTH, None).unwrap();
/// assert_eq!(registration.primary(), Facet::DefaultTyped);
/// assert_eq!(registration.delegates(), &[Facet::DefaultNonGeneric]);
/// assert_eq!(registration.connection_name(), "Default");
///
/// assert!(plan(RegistrationOptions::empty(), None).is_err());
/// ```
pub fn plan(options: RegistrationOptions, name: Option<&str>) -> DiResult<RegistrationPlan> {
    let facets: Vec<Facet> = Facet::PRIORITY
        .into_iter()
        .filter(|facet| options.contains(facet.option()))
        .collect();

    if facets.is_empty() {
        return Err(DiError::InvalidOptions {
            param: "options",
            reason: "no registration options were selected",
        });
    }

    if options.is_keyed() {
        if !cfg!(feature = "keyed") {
            return Err(DiError::InvalidOptions {
                param: "options",
                reason: "keyed registrations are not supported in this build",
            });
        }
        if name.is_none() {
            return Err(DiError::MissingArgument { param: "name" });
        }
    }

    Ok(RegistrationPlan {
        facets,
        connection_name: Arc::from(name.unwrap_or(DEFAULT_CONNECTION_NAME)),
    })
}

/// Descriptors for a `Default`-constructible connection type, primary first.
///
/// Nothing is registered; see [`DbConnectionsExt::add_db_connections`] for that.
pub fn service_descriptors<T: DbConnection + Default>(
    name: Option<&str>,
    lifetime: Lifetime,
    options: RegistrationOptions,
) -> DiResult<Vec<ServiceDescriptor>> {
    Ok(plan(options, name)?.descriptors::<T>(lifetime, default_constructor::<T>()))
}

/// Registration by option set.
///
/// ```
/// use ferrous_db_factory::config::MemoryConfiguration;
/// use ferrous_db_factory::database::{DbConnection, DbConnectionFactory, DbConnectionsExt, RegistrationOptions};
/// use ferrous_db_factory::{Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct MsSqlConnection { cs: String }
/// impl DbConnection for MsSqlConnection {
///     fn connection_string(&self) -> &str { &self.cs }
///     fn set_connection_string(&mut self, value: String) { self.cs = value; }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_configuration(Arc::new(
///     MemoryConfiguration::new().with("ConnectionStrings:Default", "Server=.;Database=app"),
/// ));
/// services
///     .add_db_connections::<MsSqlConnection>(None, Lifetime::Scoped, RegistrationOptions::DEFAULT_BOTH)
///     .unwrap();
///
/// let scope = services.build().create_scope();
/// let factory = scope.get_required_trait::<dyn DbConnectionFactory>();
/// assert_eq!(factory.create_connection().unwrap().connection_string(), "Server=.;Database=app");
/// ```
pub trait DbConnectionsExt {
    /// Registers the facets selected by `options` for a `Default`-constructible
    /// connection type. On error nothing is added.
    fn add_db_connections<T: DbConnection + Default>(
        &mut self,
        name: Option<&str>,
        lifetime: Lifetime,
        options: RegistrationOptions,
    ) -> DiResult<&mut Self> {
        self.add_db_connections_with(default_constructor::<T>(), name, lifetime, options)
    }

    /// Same as [`add_db_connections`](Self::add_db_connections) with a
    /// custom construction function.
    fn add_db_connections_with<T: DbConnection>(
        &mut self,
        create: ConnectionConstructor<T>,
        name: Option<&str>,
        lifetime: Lifetime,
        options: RegistrationOptions,
    ) -> DiResult<&mut Self>;
}

impl DbConnectionsExt for ServiceCollection {
    fn add_db_connections_with<T: DbConnection>(
        &mut self,
        create: ConnectionConstructor<T>,
        name: Option<&str>,
        lifetime: Lifetime,
        options: RegistrationOptions,
    ) -> DiResult<&mut Self> {
        let plan = plan(options, name)?;
        debug!(
            connection = plan.connection_name(),
            connection_type = std::any::type_name::<T>(),
            facets = ?plan.facets(),
            ?lifetime,
            "registering connection factory facets"
        );
        Ok(self.add_range(plan.descriptors::<T>(lifetime, create)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeConnection(String);

    impl DbConnection for FakeConnection {
        fn connection_string(&self) -> &str {
            &self.0
        }

        fn set_connection_string(&mut self, connection_string: String) {
            self.0 = connection_string;
        }
    }

    #[test]
    fn empty_options_are_rejected() {
        let err = plan(RegistrationOptions::empty(), Some("Main")).unwrap_err();
        assert!(matches!(err, DiError::InvalidOptions { param: "options", .. }));
    }

    #[test]
    fn non_generic_only_plan_has_no_conversion() {
        let plan = plan(RegistrationOptions::DEFAULT_NON_GENERIC, None).unwrap();
        assert_eq!(plan.facets(), &[Facet::DefaultNonGeneric]);

        let descriptors = plan.descriptors::<FakeConnection>(Lifetime::Singleton, default_constructor());
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].key(), &key_of_trait::<dyn DbConnectionFactory>());
        assert!(!descriptors[0].is_delegate());
    }

    #[cfg(feature = "keyed")]
    #[test]
    fn keyed_plan_orders_facets_by_priority() {
        let plan = plan(RegistrationOptions::KEYED_AND_DEFAULT_BOTH, Some("Orders")).unwrap();
        assert_eq!(plan.facets(), &Facet::PRIORITY);

        let descriptors = plan.descriptors::<FakeConnection>(Lifetime::Scoped, default_constructor());
        let primary_key = keyed_key_of_trait::<dyn TypedDbConnectionFactory<FakeConnection>>("Orders");
        assert_eq!(descriptors[0].key(), &primary_key);
        for descriptor in &descriptors[1..] {
            assert_eq!(descriptor.delegate_target(), Some(&primary_key));
            assert_eq!(descriptor.lifetime(), Lifetime::Scoped);
        }
    }

    #[cfg(feature = "keyed")]
    #[test]
    fn keyed_without_name_is_missing_argument() {
        let err = plan(RegistrationOptions::KEYED_TYPED, None).unwrap_err();
        assert!(matches!(err, DiError::MissingArgument { param: "name" }));
    }

    #[cfg(not(feature = "keyed"))]
    #[test]
    fn keyed_is_rejected_without_feature() {
        let err = plan(RegistrationOptions::KEYED_TYPED, Some("Orders")).unwrap_err();
        assert!(matches!(err, DiError::InvalidOptions { .. }));
        assert_eq!(RegistrationOptions::for_named(), RegistrationOptions::DEFAULT_BOTH);
    }
}
