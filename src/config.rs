//! Key-value configuration consumed by connection factories.
//!
//! Keys are hierarchical, separated by `:` and compared case-insensitively,
//! so `ConnectionStrings:Default` and `connectionstrings:default` name the
//! same value. Sources are read live: nothing here caches a resolved value.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::{DiError, DiResult, ServiceCollection};

/// Section holding connection strings, keyed by connection name.
pub const CONNECTION_STRINGS_SECTION: &str = "ConnectionStrings";

/// Separator between the segments of a configuration key.
pub const KEY_DELIMITER: &str = ":";

/// A readable key-value configuration source.
///
/// # Examples
///
/// ```
/// use ferrous_db_factory::config::{Configuration, MemoryConfiguration};
///
/// let config = MemoryConfiguration::new()
///     .with("ConnectionStrings:Default", "Host=localhost;Database=app");
///
/// assert_eq!(
///     config.connection_string("default").as_deref(),
///     Some("Host=localhost;Database=app")
/// );
/// assert_eq!(config.connection_string("Reporting"), None);
/// ```
pub trait Configuration: Send + Sync {
    /// Get a value by its full key
    fn get(&self, key: &str) -> Option<String>;

    /// Get the connection string configured for `name`
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(&section_key(CONNECTION_STRINGS_SECTION, name))
    }
}

fn section_key(section: &str, key: &str) -> String {
    format!("{}{}{}", section, KEY_DELIMITER, key)
}

fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Thread-safe in-memory configuration.
///
/// Values can be changed after the configuration has been handed out; the
/// change is visible to the next read.
#[derive(Default)]
pub struct MemoryConfiguration {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        Self { values: RwLock::new(values) }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets or replaces a value.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.values.write().insert(normalize_key(key), value.into());
    }

    /// Removes a value, returning the previous one.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(&normalize_key(key))
    }
}

impl Configuration for MemoryConfiguration {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(&normalize_key(key)).cloned()
    }
}

impl fmt::Debug for MemoryConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConfiguration")
            .field("keys", &self.values.read().len())
            .finish()
    }
}

/// Environment variable configuration source.
///
/// `__` in a variable name stands for the `:` key delimiter, so
/// `ConnectionStrings__Default` provides `ConnectionStrings:Default`. With a
/// prefix, only variables starting with it are visible and the prefix is
/// stripped.
#[derive(Debug, Default, Clone)]
pub struct EnvironmentSource {
    prefix: Option<String>,
}

impl EnvironmentSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }

    fn variable_key(&self, name: &str) -> Option<String> {
        let name = match &self.prefix {
            Some(prefix) => {
                if name.len() < prefix.len() || !name.is_char_boundary(prefix.len()) {
                    return None;
                }
                let (head, rest) = name.split_at(prefix.len());
                if !head.eq_ignore_ascii_case(prefix) {
                    return None;
                }
                rest
            }
            None => name,
        };
        Some(normalize_key(&name.replace("__", KEY_DELIMITER)))
    }
}

impl Configuration for EnvironmentSource {
    fn get(&self, key: &str) -> Option<String> {
        let wanted = normalize_key(key);
        env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .filter(|(name, _)| self.variable_key(name).as_deref() == Some(wanted.as_str()))
            .map(|(_, value)| value)
            .last()
    }
}

/// Configuration flattened from a JSON document.
///
/// Objects become key segments, array elements are addressed by index
/// (`Servers:0`), scalars are stored as their text form and `null` values
/// are treated as absent.
///
/// ```
/// use ferrous_db_factory::config::{Configuration, JsonSource};
///
/// let source: JsonSource = r#"{
///     "ConnectionStrings": { "Default": "Data Source=app.db" },
///     "Pool": { "Size": 8, "Hosts": ["a", "b"] }
/// }"#.parse().unwrap();
///
/// assert_eq!(source.connection_string("Default").as_deref(), Some("Data Source=app.db"));
/// assert_eq!(source.get("pool:size").as_deref(), Some("8"));
/// assert_eq!(source.get("Pool:Hosts:1").as_deref(), Some("b"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonSource {
    values: HashMap<String, String>,
}

impl JsonSource {
    pub fn from_value(value: &Value) -> Self {
        let mut values = HashMap::new();
        flatten(None, value, &mut values);
        Self { values }
    }

    /// Reads and parses a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiError::InvalidConfiguration(format!("{}: {}", path.display(), e)))?;
        content.parse()
    }
}

impl FromStr for JsonSource {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s).map_err(|e| DiError::InvalidConfiguration(e.to_string()))?;
        Ok(Self::from_value(&value))
    }
}

fn flatten(prefix: Option<&str>, value: &Value, out: &mut HashMap<String, String>) {
    let child = |segment: &str| match prefix {
        Some(prefix) => section_key(prefix, segment),
        None => segment.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (segment, nested) in map {
                flatten(Some(&child(segment)), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten(Some(&child(&index.to_string())), nested, out);
            }
        }
        Value::Null => {}
        Value::String(s) => {
            if let Some(key) = prefix {
                out.insert(normalize_key(key), s.clone());
            }
        }
        Value::Bool(_) | Value::Number(_) => {
            if let Some(key) = prefix {
                out.insert(normalize_key(key), value.to_string());
            }
        }
    }
}

impl Configuration for JsonSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(&normalize_key(key)).cloned()
    }
}

/// Ordered set of configuration sources; later sources override earlier ones.
///
/// ```
/// use ferrous_db_factory::config::{Configuration, ConfigurationBuilder, MemoryConfiguration};
///
/// let config = ConfigurationBuilder::new()
///     .add_source(MemoryConfiguration::new().with("ConnectionStrings:Default", "base"))
///     .add_source(MemoryConfiguration::new().with("ConnectionStrings:Default", "override"))
///     .build();
///
/// assert_eq!(config.connection_string("Default").as_deref(), Some("override"));
/// ```
#[derive(Default)]
pub struct ConfigurationBuilder {
    sources: Vec<Arc<dyn Configuration>>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source<C: Configuration + 'static>(self, source: C) -> Self {
        self.add_shared_source(Arc::new(source))
    }

    /// Adds a source that the caller keeps a handle to (for live updates).
    pub fn add_shared_source(mut self, source: Arc<dyn Configuration>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> LayeredConfiguration {
        LayeredConfiguration { sources: self.sources }
    }
}

/// Configuration assembled by [`ConfigurationBuilder`].
pub struct LayeredConfiguration {
    sources: Vec<Arc<dyn Configuration>>,
}

impl Configuration for LayeredConfiguration {
    fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().rev().find_map(|source| source.get(key))
    }
}

impl ServiceCollection {
    /// Registers `configuration` as the singleton `dyn Configuration` service
    /// that connection factories read their connection strings from.
    pub fn add_configuration(&mut self, configuration: Arc<dyn Configuration>) -> &mut Self {
        self.add_singleton_trait::<dyn Configuration>(configuration)
    }
}
