use ferrous_db_factory::{DiError, Lifetime, Resolver, ResolverCore, ServiceCollection};
use std::sync::{Arc, Mutex};

#[test]
fn test_scoped_lifetime() {
    #[derive(Debug, Clone)]
    struct UnitOfWork {
        id: String,
    }

    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<UnitOfWork, _>(move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        UnitOfWork { id: format!("uow-{}", *c) }
    });

    let sp = sc.build();
    let scope1 = sp.create_scope();
    let scope2 = sp.create_scope();

    let a1 = scope1.get_required::<UnitOfWork>();
    let b1 = scope1.get_required::<UnitOfWork>();
    let a2 = scope2.get_required::<UnitOfWork>();

    assert!(Arc::ptr_eq(&a1, &b1));
    assert!(!Arc::ptr_eq(&a1, &a2));
    assert_eq!(a1.id, "uow-1");
    assert_eq!(a2.id, "uow-2");
}

#[test]
fn test_cannot_resolve_scoped_from_root() {
    struct ScopedService;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<ScopedService, _>(|_| ScopedService);

    let sp = sc.build();
    assert!(matches!(sp.get::<ScopedService>(), Err(DiError::WrongLifetime(_))));
}

#[test]
fn test_scope_clones_share_cache() {
    struct Transaction;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Transaction, _>(|_| Transaction);

    let scope = sc.build().create_scope();
    let clone = scope.clone();
    assert!(Arc::ptr_eq(
        &scope.get_required::<Transaction>(),
        &clone.get_required::<Transaction>()
    ));

    let sibling = scope.create_scope();
    assert!(!Arc::ptr_eq(
        &scope.get_required::<Transaction>(),
        &sibling.get_required::<Transaction>()
    ));
}

#[test]
fn test_scoped_with_singleton_dependency() {
    struct Pool {
        size: usize,
    }
    struct Repository {
        pool: Arc<Pool>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Pool { size: 4 });
    sc.add_scoped_factory::<Repository, _>(|r| Repository {
        pool: r.get_required::<Pool>(),
    });

    let sp = sc.build();
    let r1 = sp.create_scope().get_required::<Repository>();
    let r2 = sp.create_scope().get_required::<Repository>();

    assert!(Arc::ptr_eq(&r1.pool, &r2.pool));
    assert_eq!(r1.pool.size, 4);
}

#[test]
fn test_factory_context_downgrades_to_its_scope() {
    struct Marker;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Marker, _>(|_| Marker);
    sc.add_keyed_factory::<ferrous_db_factory::WeakResolver, _>("self", Lifetime::Transient, |r| r.downgrade());

    let sp = sc.build();
    let scope = sp.create_scope();
    let weak = scope.get_keyed_required::<ferrous_db_factory::WeakResolver>("self");

    // The handle resolves scoped services from the same scope
    let owned = weak.upgrade().expect("scope is alive");
    assert!(Arc::ptr_eq(&owned.get_required::<Marker>(), &scope.get_required::<Marker>()));

    drop(owned);
    drop(scope);
    assert!(weak.upgrade().is_none());
}
