//! Builder-style connection factory registrations.
//!
//! Each method registers exactly one primary factory descriptor and returns a
//! builder. Alias facets are added on request through the `configure`
//! callback, and only when nothing else is registered under the alias key.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::descriptors::ServiceDescriptor;
use crate::key::Key;
use crate::provider::ResolverContext;
use crate::{Lifetime, ServiceCollection};

use super::connection::{DbConnection, DbConnectionFactory, TypedDbConnectionFactory};
use super::factory::{default_constructor, ConnectionConstructor, DEFAULT_CONNECTION_NAME};
use super::options::{primary_descriptor, Facet};

/// Alias registration for a default (unkeyed) connection factory.
///
/// Handed to the `configure` callback of [`DbConnectionFactoryBuilder`].
/// Aliases are transient and resolve the registered factory, so they never
/// create a factory of their own.
pub struct FactoryAliases<'a, T: DbConnection> {
    services: &'a mut ServiceCollection,
    registered: Key,
    facet: Facet,
    _connection: PhantomData<fn() -> T>,
}

impl<'a, T: DbConnection> FactoryAliases<'a, T> {
    fn new(services: &'a mut ServiceCollection, registered: Key, facet: Facet) -> Self {
        Self {
            services,
            registered,
            facet,
            _connection: PhantomData,
        }
    }

    /// Key of the registered factory descriptor
    pub fn registered_key(&self) -> &Key {
        &self.registered
    }

    /// Makes the registered factory resolvable as the default
    /// `dyn DbConnectionFactory`.
    ///
    /// Returns `false` when that service is already registered, including
    /// when the registered factory is itself the default non-generic one.
    pub fn try_register_as_non_typed_alias(&mut self) -> bool {
        let alias = Facet::DefaultNonGeneric.key::<T>(DEFAULT_CONNECTION_NAME);
        self.try_add_untyped_alias(alias)
    }

    fn try_add_untyped_alias(&mut self, alias: Key) -> bool {
        let descriptor = if self.facet.is_typed() {
            ServiceDescriptor::delegate_trait::<dyn TypedDbConnectionFactory<T>, dyn DbConnectionFactory>(
                alias,
                Lifetime::Transient,
                self.registered.clone(),
                |factory: Arc<dyn TypedDbConnectionFactory<T>>| factory.into_untyped(),
            )
        } else {
            ServiceDescriptor::delegate(alias, Lifetime::Transient, self.registered.clone())
        };
        self.try_add_alias(descriptor)
    }

    fn try_add_alias(&mut self, descriptor: ServiceDescriptor) -> bool {
        let alias = descriptor.key().clone();
        let added = self.services.try_add(descriptor);
        if added {
            debug!(alias = %alias, target = %self.registered, "registered connection factory alias");
        }
        added
    }
}

/// Alias registration for a keyed connection factory.
#[cfg(feature = "keyed")]
pub struct KeyedFactoryAliases<'a, T: DbConnection> {
    inner: FactoryAliases<'a, T>,
    service_key: Arc<str>,
}

#[cfg(feature = "keyed")]
impl<'a, T: DbConnection> KeyedFactoryAliases<'a, T> {
    /// Key of the registered factory descriptor
    pub fn registered_key(&self) -> &Key {
        self.inner.registered_key()
    }

    /// Makes the registered factory resolvable as the default
    /// `dyn DbConnectionFactory`.
    pub fn try_register_as_non_typed_alias(&mut self) -> bool {
        self.inner.try_register_as_non_typed_alias()
    }

    /// Makes the registered factory resolvable without a key, under the
    /// same service type.
    pub fn try_register_as_non_keyed_alias(&mut self) -> bool {
        let alias = match self.inner.facet {
            Facet::KeyedTyped => Facet::DefaultTyped,
            _ => Facet::DefaultNonGeneric,
        };
        let descriptor = ServiceDescriptor::delegate(
            alias.key::<T>(&self.service_key),
            Lifetime::Transient,
            self.inner.registered.clone(),
        );
        self.inner.try_add_alias(descriptor)
    }

    /// Makes the registered factory resolvable as `dyn DbConnectionFactory`
    /// under the same key.
    pub fn try_register_as_keyed_non_typed_alias(&mut self) -> bool {
        let alias = Facet::KeyedNonGeneric.key::<T>(&self.service_key);
        self.inner.try_add_untyped_alias(alias)
    }
}

type Configure<'a, A> = Box<dyn FnOnce(&mut A) + 'a>;

/// Builder returned by the default (unkeyed) registration methods.
///
/// ```
/// use ferrous_db_factory::config::MemoryConfiguration;
/// use ferrous_db_factory::database::{DbConnection, DbConnectionFactory, DbConnectionFactoryExt};
/// use ferrous_db_factory::{Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct SqliteConnection { cs: String }
/// impl DbConnection for SqliteConnection {
///     fn connection_string(&self) -> &str { &self.cs }
///     fn set_connection_string(&mut self, value: String) { self.cs = value; }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_configuration(Arc::new(
///     MemoryConfiguration::new().with("ConnectionStrings:Reporting", "Data Source=reports.db"),
/// ));
/// services
///     .add_typed_db_connection_factory::<SqliteConnection>()
///     .name("Reporting")
///     .lifetime(Lifetime::Singleton)
///     .configure(|aliases| {
///         aliases.try_register_as_non_typed_alias();
///     })
///     .register();
///
/// let provider = services.build();
/// let factory = provider.get_required_trait::<dyn DbConnectionFactory>();
/// assert_eq!(factory.create_connection().unwrap().connection_string(), "Data Source=reports.db");
/// ```
#[must_use = "call `register` to add the connection factory"]
pub struct DbConnectionFactoryBuilder<'a, T: DbConnection> {
    services: &'a mut ServiceCollection,
    create: ConnectionConstructor<T>,
    facet: Facet,
    name: Option<Arc<str>>,
    lifetime: Lifetime,
    configure: Option<Configure<'a, FactoryAliases<'a, T>>>,
}

impl<'a, T: DbConnection> DbConnectionFactoryBuilder<'a, T> {
    fn new(services: &'a mut ServiceCollection, create: ConnectionConstructor<T>, facet: Facet) -> Self {
        Self {
            services,
            create,
            facet,
            name: None,
            lifetime: Lifetime::default(),
            configure: None,
        }
    }

    /// Connection name to read from the `ConnectionStrings` section.
    /// Defaults to `"Default"`.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Factory lifetime; defaults to [`Lifetime::Scoped`].
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Callback run right after the factory descriptor has been added.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut FactoryAliases<'a, T>) + 'a,
    {
        self.configure = Some(Box::new(configure));
        self
    }

    /// Adds the factory descriptor and runs the configure callback.
    pub fn register(self) -> &'a mut ServiceCollection {
        let connection_name = self.name.unwrap_or_else(|| Arc::from(DEFAULT_CONNECTION_NAME));
        let key = self.facet.key::<T>(&connection_name);
        debug!(
            connection = %connection_name,
            connection_type = std::any::type_name::<T>(),
            facet = ?self.facet,
            lifetime = ?self.lifetime,
            "registering connection factory"
        );
        self.services
            .add(primary_descriptor(key.clone(), self.facet, self.lifetime, self.create, connection_name));

        let mut aliases = FactoryAliases::new(self.services, key, self.facet);
        if let Some(configure) = self.configure {
            configure(&mut aliases);
        }
        aliases.services
    }
}

/// Builder returned by the keyed registration methods. The connection name
/// is the service key.
#[cfg(feature = "keyed")]
#[must_use = "call `register` to add the connection factory"]
pub struct KeyedDbConnectionFactoryBuilder<'a, T: DbConnection> {
    services: &'a mut ServiceCollection,
    create: ConnectionConstructor<T>,
    facet: Facet,
    service_key: Arc<str>,
    lifetime: Lifetime,
    configure: Option<Configure<'a, KeyedFactoryAliases<'a, T>>>,
}

#[cfg(feature = "keyed")]
impl<'a, T: DbConnection> KeyedDbConnectionFactoryBuilder<'a, T> {
    fn new(services: &'a mut ServiceCollection, create: ConnectionConstructor<T>, facet: Facet, service_key: Arc<str>) -> Self {
        Self {
            services,
            create,
            facet,
            service_key,
            lifetime: Lifetime::default(),
            configure: None,
        }
    }

    /// Factory lifetime; defaults to [`Lifetime::Scoped`].
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Callback run right after the factory descriptor has been added.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut KeyedFactoryAliases<'a, T>) + 'a,
    {
        self.configure = Some(Box::new(configure));
        self
    }

    /// Adds the factory descriptor and runs the configure callback.
    pub fn register(self) -> &'a mut ServiceCollection {
        let key = self.facet.key::<T>(&self.service_key);
        debug!(
            connection = %self.service_key,
            connection_type = std::any::type_name::<T>(),
            facet = ?self.facet,
            lifetime = ?self.lifetime,
            "registering keyed connection factory"
        );
        self.services.add(primary_descriptor(
            key.clone(),
            self.facet,
            self.lifetime,
            self.create,
            self.service_key.clone(),
        ));

        let mut aliases = KeyedFactoryAliases {
            inner: FactoryAliases::new(self.services, key, self.facet),
            service_key: self.service_key,
        };
        if let Some(configure) = self.configure {
            configure(&mut aliases);
        }
        aliases.inner.services
    }
}

/// Connection factory registrations on [`ServiceCollection`].
///
/// The plain methods register `Default` connection types; the `_with`
/// variants take a construction function receiving the connection string
/// and the resolver of the scope that owns the factory.
///
/// ```
/// use ferrous_db_factory::config::MemoryConfiguration;
/// use ferrous_db_factory::database::{DbConnection, DbConnectionFactoryExt, TypedDbConnectionFactory};
/// use ferrous_db_factory::{Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct PgConnection { cs: String, application: Arc<String> }
/// impl DbConnection for PgConnection {
///     fn connection_string(&self) -> &str { &self.cs }
///     fn set_connection_string(&mut self, value: String) { self.cs = value; }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton("billing".to_string());
/// services.add_configuration(Arc::new(MemoryConfiguration::new().with("ConnectionStrings:Default", "Host=db")));
/// services
///     .add_typed_db_connection_factory_with(|cs: &str, r| PgConnection {
///         cs: cs.to_string(),
///         application: r.get_required::<String>(),
///     })
///     .register();
///
/// let scope = services.build().create_scope();
/// let conn = scope
///     .get_required_trait::<dyn TypedDbConnectionFactory<PgConnection>>()
///     .create_typed_connection()
///     .unwrap();
/// assert_eq!(conn.cs, "Host=db");
/// assert_eq!(conn.application.as_str(), "billing");
/// ```
pub trait DbConnectionFactoryExt {
    /// Registers a `dyn DbConnectionFactory` building `T`.
    fn add_db_connection_factory<T: DbConnection + Default>(&mut self) -> DbConnectionFactoryBuilder<'_, T>;

    fn add_db_connection_factory_with<T, F>(&mut self, create: F) -> DbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static;

    /// Registers a `dyn TypedDbConnectionFactory<T>`.
    fn add_typed_db_connection_factory<T: DbConnection + Default>(&mut self) -> DbConnectionFactoryBuilder<'_, T>;

    fn add_typed_db_connection_factory_with<T, F>(&mut self, create: F) -> DbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static;

    /// Registers a keyed `dyn DbConnectionFactory`; `name` is both the
    /// service key and the connection name.
    #[cfg(feature = "keyed")]
    fn add_keyed_db_connection_factory<T: DbConnection + Default>(
        &mut self,
        name: &str,
    ) -> KeyedDbConnectionFactoryBuilder<'_, T>;

    #[cfg(feature = "keyed")]
    fn add_keyed_db_connection_factory_with<T, F>(&mut self, name: &str, create: F) -> KeyedDbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static;

    /// Registers a keyed `dyn TypedDbConnectionFactory<T>`.
    #[cfg(feature = "keyed")]
    fn add_keyed_typed_db_connection_factory<T: DbConnection + Default>(
        &mut self,
        name: &str,
    ) -> KeyedDbConnectionFactoryBuilder<'_, T>;

    #[cfg(feature = "keyed")]
    fn add_keyed_typed_db_connection_factory_with<T, F>(
        &mut self,
        name: &str,
        create: F,
    ) -> KeyedDbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static;
}

impl DbConnectionFactoryExt for ServiceCollection {
    fn add_db_connection_factory<T: DbConnection + Default>(&mut self) -> DbConnectionFactoryBuilder<'_, T> {
        DbConnectionFactoryBuilder::new(self, default_constructor::<T>(), Facet::DefaultNonGeneric)
    }

    fn add_db_connection_factory_with<T, F>(&mut self, create: F) -> DbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static,
    {
        DbConnectionFactoryBuilder::new(self, ConnectionConstructor::custom(create), Facet::DefaultNonGeneric)
    }

    fn add_typed_db_connection_factory<T: DbConnection + Default>(&mut self) -> DbConnectionFactoryBuilder<'_, T> {
        DbConnectionFactoryBuilder::new(self, default_constructor::<T>(), Facet::DefaultTyped)
    }

    fn add_typed_db_connection_factory_with<T, F>(&mut self, create: F) -> DbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static,
    {
        DbConnectionFactoryBuilder::new(self, ConnectionConstructor::custom(create), Facet::DefaultTyped)
    }

    #[cfg(feature = "keyed")]
    fn add_keyed_db_connection_factory<T: DbConnection + Default>(
        &mut self,
        name: &str,
    ) -> KeyedDbConnectionFactoryBuilder<'_, T> {
        KeyedDbConnectionFactoryBuilder::new(self, default_constructor::<T>(), Facet::KeyedNonGeneric, Arc::from(name))
    }

    #[cfg(feature = "keyed")]
    fn add_keyed_db_connection_factory_with<T, F>(&mut self, name: &str, create: F) -> KeyedDbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static,
    {
        KeyedDbConnectionFactoryBuilder::new(self, ConnectionConstructor::custom(create), Facet::KeyedNonGeneric, Arc::from(name))
    }

    #[cfg(feature = "keyed")]
    fn add_keyed_typed_db_connection_factory<T: DbConnection + Default>(
        &mut self,
        name: &str,
    ) -> KeyedDbConnectionFactoryBuilder<'_, T> {
        KeyedDbConnectionFactoryBuilder::new(self, default_constructor::<T>(), Facet::KeyedTyped, Arc::from(name))
    }

    #[cfg(feature = "keyed")]
    fn add_keyed_typed_db_connection_factory_with<T, F>(
        &mut self,
        name: &str,
        create: F,
    ) -> KeyedDbConnectionFactoryBuilder<'_, T>
    where
        T: DbConnection,
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static,
    {
        KeyedDbConnectionFactoryBuilder::new(self, ConnectionConstructor::custom(create), Facet::KeyedTyped, Arc::from(name))
    }
}
