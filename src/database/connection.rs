//! Connection and connection factory abstractions.

use std::sync::Arc;

use crate::DiResult;

/// A database connection that is configured through its connection string.
///
/// Types that are also `Default` can be registered without a construction
/// function: the factory builds `T::default()` and assigns the string.
///
/// ```
/// use ferrous_db_factory::database::DbConnection;
///
/// #[derive(Default)]
/// struct SqliteConnection { connection_string: String }
///
/// impl DbConnection for SqliteConnection {
///     fn connection_string(&self) -> &str { &self.connection_string }
///     fn set_connection_string(&mut self, value: String) { self.connection_string = value; }
/// }
///
/// let mut conn = SqliteConnection::default();
/// conn.set_connection_string("Data Source=app.db".into());
/// assert_eq!(conn.connection_string(), "Data Source=app.db");
/// ```
pub trait DbConnection: Send + 'static {
    fn connection_string(&self) -> &str;

    fn set_connection_string(&mut self, connection_string: String);
}

/// Non-generic connection factory: callers that do not care about the
/// concrete connection type resolve `dyn DbConnectionFactory`.
pub trait DbConnectionFactory: Send + Sync {
    /// Creates a new, unopened connection.
    fn create_connection(&self) -> DiResult<Box<dyn DbConnection>>;
}

/// Typed connection factory, resolved as `dyn TypedDbConnectionFactory<T>`.
pub trait TypedDbConnectionFactory<T: DbConnection>: DbConnectionFactory {
    /// Creates a new, unopened connection of the concrete type.
    fn create_typed_connection(&self) -> DiResult<T>;

    /// The same factory viewed through its non-generic interface.
    ///
    /// Implementations return `self`; no new factory is allocated.
    fn into_untyped(self: Arc<Self>) -> Arc<dyn DbConnectionFactory>;
}
