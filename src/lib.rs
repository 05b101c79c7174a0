//! # ferrous-db-factory
//!
//! Named database connection factories for a small dependency injection
//! container, with a registration API modelled on
//! Microsoft.Extensions.DependencyInjection.
//!
//! ## Features
//!
//! - **Named connections**: each factory is bound to a connection name and
//!   reads `ConnectionStrings:<name>` from configuration on every call
//! - **Typed and non-generic factories**: resolve `dyn TypedDbConnectionFactory<T>`
//!   when the connection type matters, `dyn DbConnectionFactory` when it does not
//! - **Keyed registrations**: several named connections side by side (feature `keyed`, on by default)
//! - **Shared instances**: every facet of one registration resolves to the same
//!   factory inside a scope
//! - **Circular dependency detection**: with the full resolution path in the error
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_db_factory::config::MemoryConfiguration;
//! use ferrous_db_factory::database::{DbConnection, DbConnectionFactoryExt, TypedDbConnectionFactory};
//! use ferrous_db_factory::{Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct PgConnection {
//!     connection_string: String,
//! }
//!
//! impl DbConnection for PgConnection {
//!     fn connection_string(&self) -> &str {
//!         &self.connection_string
//!     }
//!
//!     fn set_connection_string(&mut self, value: String) {
//!         self.connection_string = value;
//!     }
//! }
//!
//! let config = Arc::new(MemoryConfiguration::new().with("ConnectionStrings:Default", "Host=primary"));
//!
//! let mut services = ServiceCollection::new();
//! services.add_configuration(config.clone());
//! services.add_typed_db_connection_factory::<PgConnection>().register();
//!
//! let provider = services.build();
//! let scope = provider.create_scope();
//! let factory = scope.get_required_trait::<dyn TypedDbConnectionFactory<PgConnection>>();
//! assert_eq!(factory.create_typed_connection().unwrap().connection_string(), "Host=primary");
//!
//! // Connection strings are read live
//! config.set("ConnectionStrings:Default", "Host=failover");
//! assert_eq!(factory.create_typed_connection().unwrap().connection_string(), "Host=failover");
//! ```
//!
//! ## Keyed Connections
//!
//! ```rust
//! # #[cfg(feature = "keyed")]
//! # {
//! use ferrous_db_factory::config::MemoryConfiguration;
//! use ferrous_db_factory::database::{
//!     DbConnection, DbConnectionFactory, DbConnectionsExt, RegistrationOptions, TypedDbConnectionFactory,
//! };
//! use ferrous_db_factory::{Lifetime, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct MySqlConnection(String);
//!
//! impl DbConnection for MySqlConnection {
//!     fn connection_string(&self) -> &str { &self.0 }
//!     fn set_connection_string(&mut self, value: String) { self.0 = value; }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_configuration(Arc::new(
//!     MemoryConfiguration::new()
//!         .with("ConnectionStrings:Orders", "Server=orders")
//!         .with("ConnectionStrings:Audit", "Server=audit"),
//! ));
//! services
//!     .add_db_connections::<MySqlConnection>(Some("Orders"), Lifetime::Scoped, RegistrationOptions::KEYED_BOTH)
//!     .unwrap()
//!     .add_db_connections::<MySqlConnection>(Some("Audit"), Lifetime::Scoped, RegistrationOptions::KEYED_BOTH)
//!     .unwrap();
//!
//! let scope = services.build().create_scope();
//! let audit = scope.get_keyed_trait_required::<dyn DbConnectionFactory>("Audit");
//! assert_eq!(audit.create_connection().unwrap().connection_string(), "Server=audit");
//!
//! let orders = scope.get_keyed_trait_required::<dyn TypedDbConnectionFactory<MySqlConnection>>("Orders");
//! assert_eq!(orders.create_typed_connection().unwrap().0, "Server=orders");
//! # }
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire application
//! - **Scoped**: Created once per scope, the default for connection factories
//! - **Transient**: Created fresh on every resolution
//!
//! ## Logging
//!
//! Registration and resolution emit [`tracing`] events (`debug` for
//! registrations, `trace` for resolutions, `warn` for missing connection
//! strings). The crate never installs a subscriber.

pub mod collection;
pub mod config;
pub mod database;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod traits;

mod internal;
mod registration;

pub use collection::ServiceCollection;
pub use descriptors::{Construction, ServiceDescriptor};
pub use error::{DiError, DiResult};
pub use internal::CircularPanic;
pub use key::{key_of_trait, key_of_type, keyed_key_of_trait, keyed_key_of_type, Key};
pub use lifetime::Lifetime;
pub use provider::{OwnedResolver, ResolverContext, Scope, ServiceProvider, WeakResolver};
pub use traits::{Resolver, ResolverCore};
