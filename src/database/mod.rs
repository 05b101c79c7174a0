//! Named database connection factories and their container registrations.
//!
//! A connection factory is bound to a connection name and reads
//! `ConnectionStrings:<name>` from the registered
//! [`Configuration`](crate::config::Configuration) every time it creates a
//! connection. Registrations come in two styles:
//!
//! - [`DbConnectionFactoryExt`]: one facet per call, with optional aliases
//! - [`DbConnectionsExt`]: several facets at once, selected by
//!   [`RegistrationOptions`]

pub mod connection;
pub mod extensions;
pub mod factory;
pub mod options;

pub use connection::{DbConnection, DbConnectionFactory, TypedDbConnectionFactory};
pub use extensions::{DbConnectionFactoryBuilder, DbConnectionFactoryExt, FactoryAliases};
#[cfg(feature = "keyed")]
pub use extensions::{KeyedDbConnectionFactoryBuilder, KeyedFactoryAliases};
pub use factory::{default_constructor, ConnectionConstructor, NamedConnectionFactory, DEFAULT_CONNECTION_NAME};
pub use options::{plan, service_descriptors, DbConnectionsExt, Facet, RegistrationOptions, RegistrationPlan};
