//! Error types for the container and the connection factories.

use thiserror::Error;

/// Dependency injection and connection factory errors
///
/// Covers the three places things can go wrong: building registrations
/// (missing arguments, unusable option combinations), resolving services
/// from the container, and creating connections at runtime.
///
/// # Examples
///
/// ```rust
/// use ferrous_db_factory::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
///
/// let missing = DiError::ConnectionStringNotFound("Reporting".to_string());
/// assert_eq!(
///     missing.to_string(),
///     "Connection string not found for connection name: 'Reporting'"
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Service not registered
    #[error("Service not found: {0}")]
    NotFound(String),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Invalid lifetime resolution (e.g., scoped from root)
    #[error("Lifetime error: {0}")]
    WrongLifetime(&'static str),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A required registration argument was not supplied
    #[error("Missing required argument '{param}'")]
    MissingArgument {
        /// Name of the argument
        param: &'static str,
    },
    /// Registration options resolve to nothing usable
    #[error("Invalid argument '{param}': {reason}")]
    InvalidOptions {
        /// Name of the argument
        param: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
    /// No connection string is configured for the bound connection name
    #[error("Connection string not found for connection name: '{0}'")]
    ConnectionStringNotFound(String),
    /// A configuration source could not be read or parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A custom connection constructor needs the provider or scope its
    /// factory was created in, and that no longer exists
    #[error("Resolver dropped: the owning provider or scope has been released")]
    ResolverDropped,
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use ferrous_db_factory::{DiResult, DiError};
///
/// fn connection_name(configured: Option<&str>) -> DiResult<String> {
///     configured
///         .map(str::to_owned)
///         .ok_or(DiError::MissingArgument { param: "name" })
/// }
///
/// assert!(connection_name(None).is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
