//! The named connection factory.

use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::config::Configuration;
use crate::provider::{ResolverContext, WeakResolver};
use crate::traits::{Resolver, ResolverCore};
use crate::{DiError, DiResult};

use super::connection::{DbConnection, DbConnectionFactory, TypedDbConnectionFactory};

/// Connection name used when a registration does not supply one.
pub const DEFAULT_CONNECTION_NAME: &str = "Default";

/// How a [`NamedConnectionFactory`] turns a connection string into a connection.
pub enum ConnectionConstructor<T> {
    /// Builds from the connection string alone. Needs no resolver.
    Default(fn(&str) -> T),
    /// Caller-supplied function that also receives the resolver of the scope
    /// that owns the factory.
    Custom(Arc<dyn Fn(&str, &ResolverContext) -> T + Send + Sync>),
}

impl<T> ConnectionConstructor<T> {
    pub fn custom<F>(create: F) -> Self
    where
        F: Fn(&str, &ResolverContext) -> T + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(create))
    }
}

impl<T> Clone for ConnectionConstructor<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Default(build) => Self::Default(*build),
            Self::Custom(create) => Self::Custom(Arc::clone(create)),
        }
    }
}

impl<T> fmt::Debug for ConnectionConstructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(_) => f.write_str("Default"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn build_default<T: DbConnection + Default>(connection_string: &str) -> T {
    let mut connection = T::default();
    connection.set_connection_string(connection_string.to_owned());
    connection
}

/// Constructor for `Default` connections: `T::default()` with the string assigned.
pub fn default_constructor<T: DbConnection + Default>() -> ConnectionConstructor<T> {
    ConnectionConstructor::Default(build_default::<T>)
}

/// Connection factory bound to one connection name.
///
/// Every [`create_typed_connection`](TypedDbConnectionFactory::create_typed_connection)
/// call looks the connection string up again, so configuration changes are
/// picked up without re-resolving the factory. Nothing is pooled or cached.
///
/// The factory holds only a weak handle to its scope. A
/// [`ConnectionConstructor::Default`] factory keeps working after the scope
/// and provider are gone; a [`ConnectionConstructor::Custom`] one then fails
/// with [`DiError::ResolverDropped`].
///
/// # Examples
///
/// ```
/// use ferrous_db_factory::config::MemoryConfiguration;
/// use ferrous_db_factory::database::{
///     default_constructor, DbConnection, NamedConnectionFactory, TypedDbConnectionFactory,
/// };
/// use ferrous_db_factory::{ServiceCollection, ResolverCore};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct PgConnection { cs: String }
/// impl DbConnection for PgConnection {
///     fn connection_string(&self) -> &str { &self.cs }
///     fn set_connection_string(&mut self, value: String) { self.cs = value; }
/// }
///
/// let config = Arc::new(MemoryConfiguration::new().with("ConnectionStrings:Default", "X"));
/// let provider = ServiceCollection::new().build();
/// let factory = NamedConnectionFactory::new(
///     default_constructor::<PgConnection>(),
///     provider.downgrade(),
///     config.clone(),
///     "Default",
/// );
///
/// assert_eq!(factory.create_typed_connection().unwrap().connection_string(), "X");
/// config.set("ConnectionStrings:Default", "Y");
/// assert_eq!(factory.create_typed_connection().unwrap().connection_string(), "Y");
/// ```
pub struct NamedConnectionFactory<T> {
    create: ConnectionConstructor<T>,
    resolver: WeakResolver,
    configuration: Arc<dyn Configuration>,
    connection_name: Arc<str>,
}

impl<T: DbConnection> NamedConnectionFactory<T> {
    pub fn new(
        create: ConnectionConstructor<T>,
        resolver: WeakResolver,
        configuration: Arc<dyn Configuration>,
        connection_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            create,
            resolver,
            configuration,
            connection_name: connection_name.into(),
        }
    }

    /// Builds a factory inside a container factory: takes the configuration
    /// registered as `dyn Configuration` and a weak handle to `ctx`.
    pub fn from_context(
        ctx: &ResolverContext,
        create: ConnectionConstructor<T>,
        connection_name: impl Into<Arc<str>>,
    ) -> DiResult<Self> {
        let configuration = ctx.get_trait::<dyn Configuration>()?;
        Ok(Self::new(create, ctx.downgrade(), configuration, connection_name))
    }

    /// The connection name this factory is bound to
    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    fn connection_string(&self) -> DiResult<String> {
        self.configuration
            .connection_string(&self.connection_name)
            .ok_or_else(|| {
                warn!(connection = %self.connection_name, "connection string not configured");
                DiError::ConnectionStringNotFound(self.connection_name.to_string())
            })
    }
}

impl<T: DbConnection> TypedDbConnectionFactory<T> for NamedConnectionFactory<T> {
    fn create_typed_connection(&self) -> DiResult<T> {
        trace!(connection = %self.connection_name, constructor = ?self.create, "creating connection");
        let connection_string = self.connection_string()?;
        match &self.create {
            ConnectionConstructor::Default(build) => Ok(build(&connection_string)),
            ConnectionConstructor::Custom(create) => {
                let resolver = self.resolver.upgrade().ok_or(DiError::ResolverDropped)?;
                let ctx = ResolverContext::new(&resolver);
                Ok(create(&connection_string, &ctx))
            }
        }
    }

    fn into_untyped(self: Arc<Self>) -> Arc<dyn DbConnectionFactory> {
        self
    }
}

impl<T: DbConnection> DbConnectionFactory for NamedConnectionFactory<T> {
    fn create_connection(&self) -> DiResult<Box<dyn DbConnection>> {
        Ok(Box::new(self.create_typed_connection()?))
    }
}

impl<T> fmt::Debug for NamedConnectionFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedConnectionFactory")
            .field("connection", &std::any::type_name::<T>())
            .field("connection_name", &self.connection_name)
            .field("resolver", &self.resolver)
            .finish()
    }
}
