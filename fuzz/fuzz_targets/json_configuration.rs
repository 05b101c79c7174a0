#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_db_factory::config::{Configuration, JsonSource};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing either fails cleanly or yields a source that answers any key
    if let Ok(source) = text.parse::<JsonSource>() {
        let _ = source.connection_string("Default");
        assert_eq!(source.get(text), source.get(&text.to_lowercase()));
    }
});
