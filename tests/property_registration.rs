/// Property-based tests for registration option resolution
///
/// These tests use proptest to generate option bitmasks and connection names
/// and verify invariants that should hold for every accepted combination.

use ferrous_db_factory::config::MemoryConfiguration;
use ferrous_db_factory::database::{
    plan, DbConnection, DbConnectionFactory, DbConnectionsExt, Facet, RegistrationOptions,
};
use ferrous_db_factory::{DiError, Lifetime, Resolver, ServiceCollection};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Default)]
struct TestConnection(String);

impl DbConnection for TestConnection {
    fn connection_string(&self) -> &str {
        &self.0
    }

    fn set_connection_string(&mut self, connection_string: String) {
        self.0 = connection_string;
    }
}

fn options() -> impl Strategy<Value = RegistrationOptions> {
    (0u32..16).prop_map(RegistrationOptions::from_bits_truncate)
}

fn connection_name() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z][A-Za-z0-9_]{0,12}")
}

fn lifetime() -> impl Strategy<Value = Lifetime> {
    prop_oneof![Just(Lifetime::Singleton), Just(Lifetime::Scoped), Just(Lifetime::Transient)]
}

// Property: an accepted plan has one facet per selected flag, in priority order
proptest! {
    #[test]
    fn plan_matches_selected_flags(options in options(), name in connection_name()) {
        match plan(options, name.as_deref()) {
            Ok(plan) => {
                prop_assert_eq!(plan.len() as u32, options.bits().count_ones());
                prop_assert!(plan.facets().iter().all(|f| options.contains(f.option())));
                prop_assert!(plan.facets().windows(2).all(|w| w[0] < w[1]));

                let expected_primary = Facet::PRIORITY.into_iter().find(|f| options.contains(f.option()));
                prop_assert_eq!(Some(plan.primary()), expected_primary);
                prop_assert_eq!(plan.delegates().len(), plan.len() - 1);
                prop_assert_eq!(plan.connection_name(), name.as_deref().unwrap_or("Default"));
            }
            Err(DiError::InvalidOptions { .. }) => {
                prop_assert!(options.is_empty() || (options.is_keyed() && !cfg!(feature = "keyed")));
            }
            Err(DiError::MissingArgument { param }) => {
                prop_assert_eq!(param, "name");
                prop_assert!(options.is_keyed() && name.is_none());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}

// Property: exactly one descriptor builds the factory, the rest forward to it
proptest! {
    #[test]
    fn registration_adds_one_primary(options in options(), name in connection_name(), lifetime in lifetime()) {
        let mut services = ServiceCollection::new();
        let result = services
            .add_db_connections::<TestConnection>(name.as_deref(), lifetime, options)
            .map(|s| s.len());

        match result {
            Ok(count) => {
                prop_assert_eq!(count as u32, options.bits().count_ones());
                let descriptors = services.descriptors();
                prop_assert_eq!(descriptors.iter().filter(|d| !d.is_delegate()).count(), 1);
                prop_assert!(!descriptors[0].is_delegate());
                prop_assert!(descriptors[1..].iter().all(|d| d.delegate_target() == Some(descriptors[0].key())));
                prop_assert!(descriptors.iter().all(|d| d.lifetime() == lifetime));
            }
            Err(_) => prop_assert!(services.is_empty()),
        }
    }
}

// Property: every non-generic facet of a registration creates the named connection
proptest! {
    #[test]
    fn non_generic_facets_read_named_connection(name in "[A-Za-z][A-Za-z0-9]{0,8}", value in "[a-z=;]{1,16}") {
        let mut services = ServiceCollection::new();
        services.add_configuration(Arc::new(
            MemoryConfiguration::new().with(&format!("ConnectionStrings:{}", name), value.clone()),
        ));
        services
            .add_db_connections::<TestConnection>(Some(&name), Lifetime::Scoped, RegistrationOptions::for_named())
            .unwrap();

        let scope = services.build().create_scope();
        let factory = scope.get_required_trait::<dyn DbConnectionFactory>();
        let connection = factory.create_connection().unwrap();
        prop_assert_eq!(connection.connection_string(), value.as_str());

        #[cfg(feature = "keyed")]
        {
            let keyed = scope.get_keyed_trait_required::<dyn DbConnectionFactory>(&name);
            prop_assert_eq!(Arc::as_ptr(&keyed) as *const (), Arc::as_ptr(&factory) as *const ());
        }
    }
}
