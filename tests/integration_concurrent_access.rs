/// Concurrent access integration tests
///
/// These tests verify that connection factories behave correctly when shared
/// across threads: one singleton factory, isolated scopes, and configuration
/// updates visible to concurrent readers.

use crossbeam_utils::thread;
use ferrous_db_factory::config::MemoryConfiguration;
use ferrous_db_factory::database::{
    DbConnection, DbConnectionFactory, DbConnectionFactoryExt, TypedDbConnectionFactory,
};
use ferrous_db_factory::{Lifetime, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct PooledConnection {
    connection_string: String,
}

impl DbConnection for PooledConnection {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn set_connection_string(&mut self, connection_string: String) {
        self.connection_string = connection_string;
    }
}

const THREADS: usize = 8;

#[test]
fn test_singleton_factory_created_once_under_contention() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let mut services = ServiceCollection::new();
    services.add_configuration(Arc::new(
        MemoryConfiguration::new().with("ConnectionStrings:Default", "Host=shared"),
    ));
    services
        .add_db_connection_factory_with(move |cs: &str, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            PooledConnection { connection_string: cs.to_string() }
        })
        .lifetime(Lifetime::Singleton)
        .register();
    let provider = services.build();

    let factories = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    let factory = provider.get_required_trait::<dyn DbConnectionFactory>();
                    let conn = factory.create_connection().unwrap();
                    assert_eq!(conn.connection_string(), "Host=shared");
                    factory
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
    })
    .unwrap();

    assert!(factories.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    // One connection per thread; the factory itself does not construct connections up front
    assert_eq!(built.load(Ordering::SeqCst), THREADS);
}

#[test]
fn test_scopes_on_separate_threads_are_isolated() {
    let mut services = ServiceCollection::new();
    services.add_configuration(Arc::new(
        MemoryConfiguration::new().with("ConnectionStrings:Default", "Host=scoped"),
    ));
    services.add_typed_db_connection_factory::<PooledConnection>().register();
    let provider = services.build();

    let addresses = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    let scope = provider.create_scope();
                    let a = scope.get_required_trait::<dyn TypedDbConnectionFactory<PooledConnection>>();
                    let b = scope.get_required_trait::<dyn TypedDbConnectionFactory<PooledConnection>>();
                    assert!(Arc::ptr_eq(&a, &b));
                    assert_eq!(a.create_typed_connection().unwrap().connection_string, "Host=scoped");
                    // Returned factories stay alive so addresses cannot be reused
                    (Arc::as_ptr(&a) as *const () as usize, a)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
    })
    .unwrap();

    let mut unique: Vec<usize> = addresses.iter().map(|(address, _)| *address).collect();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), THREADS);
}

#[test]
fn test_configuration_updates_visible_to_concurrent_readers() {
    let config = Arc::new(MemoryConfiguration::new().with("ConnectionStrings:Default", "v0"));

    let mut services = ServiceCollection::new();
    services.add_configuration(config.clone());
    services
        .add_typed_db_connection_factory::<PooledConnection>()
        .lifetime(Lifetime::Singleton)
        .register();
    let provider = services.build();
    let factory = provider.get_required_trait::<dyn TypedDbConnectionFactory<PooledConnection>>();

    thread::scope(|s| {
        s.spawn(|_| {
            for i in 1..=100 {
                config.set("ConnectionStrings:Default", format!("v{}", i));
            }
        });
        for _ in 0..THREADS {
            s.spawn(|_| {
                for _ in 0..100 {
                    let conn = factory.create_typed_connection().unwrap();
                    assert!(conn.connection_string.starts_with('v'));
                }
            });
        }
    })
    .unwrap();

    assert_eq!(factory.create_typed_connection().unwrap().connection_string, "v100");
}
