/// Single-facet registrations through DbConnectionFactoryExt, and aliases.

use ferrous_db_factory::config::MemoryConfiguration;
use ferrous_db_factory::database::{
    DbConnection, DbConnectionFactory, DbConnectionFactoryExt, TypedDbConnectionFactory,
};
use ferrous_db_factory::{key_of_trait, Lifetime, Resolver, ServiceCollection};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MsSqlConnection {
    connection_string: String,
}

impl DbConnection for MsSqlConnection {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn set_connection_string(&mut self, connection_string: String) {
        self.connection_string = connection_string;
    }
}

fn configured() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services.add_configuration(Arc::new(
        MemoryConfiguration::new()
            .with("ConnectionStrings:Default", "Server=default")
            .with("ConnectionStrings:Sales", "Server=sales"),
    ));
    services
}

fn data_ptr<T: ?Sized>(value: &Arc<T>) -> *const () {
    Arc::as_ptr(value) as *const ()
}

#[test]
fn test_registers_exactly_one_descriptor() {
    let mut services = configured();
    services.add_db_connection_factory::<MsSqlConnection>().register();
    services.add_typed_db_connection_factory::<MsSqlConnection>().register();

    assert_eq!(services.len(), 3);
    assert!(services.descriptors()[1..].iter().all(|d| d.lifetime() == Lifetime::Scoped));
    assert!(services.descriptors()[1..].iter().all(|d| !d.is_delegate()));
}

#[test]
fn test_typed_factory_non_typed_alias() {
    let mut services = configured();
    let mut added = false;
    services
        .add_typed_db_connection_factory::<MsSqlConnection>()
        .name("Sales")
        .configure(|aliases| added = aliases.try_register_as_non_typed_alias())
        .register();
    assert!(added);
    assert_eq!(services.len(), 3);

    let alias = &services.descriptors()[2];
    assert_eq!(alias.lifetime(), Lifetime::Transient);
    assert_eq!(alias.key(), &key_of_trait::<dyn DbConnectionFactory>());

    let scope = services.build().create_scope();
    let typed = scope.get_required_trait::<dyn TypedDbConnectionFactory<MsSqlConnection>>();
    let untyped = scope.get_required_trait::<dyn DbConnectionFactory>();

    assert_eq!(data_ptr(&typed), data_ptr(&untyped));
    assert_eq!(untyped.create_connection().unwrap().connection_string(), "Server=sales");
}

#[test]
fn test_non_typed_alias_of_non_typed_factory_is_noop() {
    let mut services = configured();
    let mut added = true;
    services
        .add_db_connection_factory::<MsSqlConnection>()
        .configure(|aliases| added = aliases.try_register_as_non_typed_alias())
        .register();

    assert!(!added);
    assert_eq!(services.len(), 2);
}

#[test]
fn test_alias_does_not_replace_existing_registration() {
    let mut services = configured();
    services.add_db_connection_factory::<MsSqlConnection>().register();
    services
        .add_typed_db_connection_factory::<MsSqlConnection>()
        .name("Sales")
        .configure(|aliases| assert!(!aliases.try_register_as_non_typed_alias()))
        .register();

    let scope = services.build().create_scope();
    let untyped = scope.get_required_trait::<dyn DbConnectionFactory>();
    assert_eq!(untyped.create_connection().unwrap().connection_string(), "Server=default");
}

#[test]
fn test_custom_constructor_with_singleton_lifetime() {
    let mut services = configured();
    services
        .add_db_connection_factory_with(|cs: &str, _| MsSqlConnection {
            connection_string: format!("{};Pooling=false", cs),
        })
        .lifetime(Lifetime::Singleton)
        .register();

    let provider = services.build();
    let a = provider.get_required_trait::<dyn DbConnectionFactory>();
    let b = provider.create_scope().get_required_trait::<dyn DbConnectionFactory>();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(
        a.create_connection().unwrap().connection_string(),
        "Server=default;Pooling=false"
    );
}

#[cfg(feature = "keyed")]
mod keyed {
    use super::*;
    use ferrous_db_factory::keyed_key_of_trait;

    #[test]
    fn test_keyed_typed_factory_with_all_aliases() {
        let mut services = configured();
        let mut results = Vec::new();
        services
            .add_keyed_typed_db_connection_factory::<MsSqlConnection>("Sales")
            .configure(|aliases| {
                results.push(aliases.try_register_as_non_keyed_alias());
                results.push(aliases.try_register_as_keyed_non_typed_alias());
                results.push(aliases.try_register_as_non_typed_alias());
            })
            .register();

        assert_eq!(results, vec![true, true, true]);
        assert_eq!(services.len(), 5);

        let scope = services.build().create_scope();
        let primary = scope.get_keyed_trait_required::<dyn TypedDbConnectionFactory<MsSqlConnection>>("Sales");
        let non_keyed = scope.get_required_trait::<dyn TypedDbConnectionFactory<MsSqlConnection>>();
        let keyed_untyped = scope.get_keyed_trait_required::<dyn DbConnectionFactory>("Sales");
        let untyped = scope.get_required_trait::<dyn DbConnectionFactory>();

        assert!(Arc::ptr_eq(&primary, &non_keyed));
        assert_eq!(data_ptr(&primary), data_ptr(&keyed_untyped));
        assert_eq!(data_ptr(&primary), data_ptr(&untyped));
        assert_eq!(untyped.create_connection().unwrap().connection_string(), "Server=sales");
    }

    #[test]
    fn test_keyed_non_typed_factory_aliases() {
        let mut services = configured();
        services
            .add_keyed_db_connection_factory::<MsSqlConnection>("Sales")
            .lifetime(Lifetime::Singleton)
            .configure(|aliases| {
                assert_eq!(
                    aliases.registered_key(),
                    &keyed_key_of_trait::<dyn DbConnectionFactory>("Sales")
                );
                // Already the keyed non-typed service
                assert!(!aliases.try_register_as_keyed_non_typed_alias());
                assert!(aliases.try_register_as_non_keyed_alias());
                // The non-keyed alias above took the default non-typed slot
                assert!(!aliases.try_register_as_non_typed_alias());
            })
            .register();

        let provider = services.build();
        let keyed = provider.get_keyed_trait_required::<dyn DbConnectionFactory>("Sales");
        let default = provider.get_required_trait::<dyn DbConnectionFactory>();
        assert!(Arc::ptr_eq(&keyed, &default));
    }

    #[test]
    fn test_keyed_factories_for_several_names() {
        let mut services = configured();
        services.add_keyed_db_connection_factory::<MsSqlConnection>("Default").register();
        services.add_keyed_db_connection_factory::<MsSqlConnection>("Sales").register();

        let scope = services.build().create_scope();
        let sales = scope.get_keyed_trait_required::<dyn DbConnectionFactory>("Sales");
        let default = scope.get_keyed_trait_required::<dyn DbConnectionFactory>("Default");

        assert!(!Arc::ptr_eq(&sales, &default));
        assert_eq!(sales.create_connection().unwrap().connection_string(), "Server=sales");
        assert_eq!(default.create_connection().unwrap().connection_string(), "Server=default");
        assert!(scope.get_trait::<dyn DbConnectionFactory>().is_err());
    }

    #[test]
    fn test_keyed_custom_constructor() {
        let mut services = configured();
        services.add_singleton(30u32);
        services
            .add_keyed_typed_db_connection_factory_with("Sales", |cs: &str, r| MsSqlConnection {
                connection_string: format!("{};Timeout={}", cs, r.get_required::<u32>()),
            })
            .register();

        let scope = services.build().create_scope();
        let factory = scope.get_keyed_trait_required::<dyn TypedDbConnectionFactory<MsSqlConnection>>("Sales");
        assert_eq!(
            factory.create_typed_connection().unwrap().connection_string(),
            "Server=sales;Timeout=30"
        );
    }
}
