#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_db_factory::database::{DbConnection, DbConnectionsExt, RegistrationOptions};
use ferrous_db_factory::{Lifetime, ServiceCollection};

#[derive(Default)]
struct FuzzConnection(String);

impl DbConnection for FuzzConnection {
    fn connection_string(&self) -> &str {
        &self.0
    }

    fn set_connection_string(&mut self, connection_string: String) {
        self.0 = connection_string;
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let options = RegistrationOptions::from_bits_retain(u32::from(data[0]));
    let lifetime = match data[1] % 3 {
        0 => Lifetime::Singleton,
        1 => Lifetime::Scoped,
        _ => Lifetime::Transient,
    };
    let name = std::str::from_utf8(&data[2..]).ok().filter(|_| data[1] & 0x80 != 0);

    let mut services = ServiceCollection::new();
    match services.add_db_connections::<FuzzConnection>(name, lifetime, options) {
        Ok(services) => {
            let known = (options & RegistrationOptions::all()).bits().count_ones() as usize;
            assert_eq!(services.len(), known);
        }
        Err(_) => assert!(services.is_empty()),
    }
});
