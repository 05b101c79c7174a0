//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// Connection factory registrations default to [`Lifetime::Scoped`]: one
/// factory per unit of work, while every `create_connection` call still
/// builds a fresh connection.
///
/// # Examples
///
/// ```rust
/// use ferrous_db_factory::{ServiceCollection, Resolver, Lifetime};
/// use std::sync::Arc;
///
/// struct Pool { size: usize }
/// struct UnitOfWork { id: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Pool { size: 4 });
/// services.add_scoped_factory::<UnitOfWork, _>(|_| UnitOfWork { id: 7 });
///
/// let provider = services.build();
/// let scope_a = provider.create_scope();
/// let scope_b = provider.create_scope();
///
/// // Singleton: shared by every scope
/// assert!(Arc::ptr_eq(&scope_a.get_required::<Pool>(), &scope_b.get_required::<Pool>()));
///
/// // Scoped: shared inside a scope, distinct across scopes
/// let work = scope_a.get_required::<UnitOfWork>();
/// assert!(Arc::ptr_eq(&work, &scope_a.get_required::<UnitOfWork>()));
/// assert!(!Arc::ptr_eq(&work, &scope_b.get_required::<UnitOfWork>()));
/// assert_eq!(Lifetime::default(), Lifetime::Scoped);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Single instance per root provider, cached forever
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime.
    /// Cannot be resolved from the root provider.
    #[default]
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}
