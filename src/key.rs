//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Key for service storage and lookup.
///
/// A key is the `(requested type, optional service key)` pair a descriptor
/// is registered under. Concrete types are identified by `TypeId`, trait
/// objects by their type name since `dyn Trait` registrations are stored
/// as `Arc<dyn Trait>`.
///
/// # Key Types
///
/// - **Type** / **Trait**: default (unkeyed) registrations
/// - **TypeKeyed** / **TraitKeyed**: keyed registrations, disambiguated by
///   a string key alongside the type
///
/// # Examples
///
/// ```rust
/// use ferrous_db_factory::{Key, key_of_type, keyed_key_of_type};
///
/// let plain = key_of_type::<u32>();
/// let keyed = keyed_key_of_type::<u32>("replica");
///
/// assert_eq!(plain.service_key(), None);
/// assert_eq!(keyed.service_key(), Some("replica"));
/// assert_ne!(plain, keyed);
/// assert_eq!(keyed, keyed_key_of_type::<u32>("replica"));
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object key (`dyn Trait`) identified by its type name
    Trait(&'static str),
    /// Keyed concrete type
    TypeKeyed(TypeId, &'static str, Arc<str>),
    /// Keyed trait object
    TraitKeyed(&'static str, Arc<str>),
}

impl Key {
    /// Get the type or trait name for display
    ///
    /// ```rust
    /// use ferrous_db_factory::keyed_key_of_type;
    ///
    /// assert_eq!(keyed_key_of_type::<u64>("port").display_name(), "u64");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
            Key::TypeKeyed(_, name, _) => name,
            Key::TraitKeyed(name, _) => name,
        }
    }

    /// Get the service key for keyed registrations, or None for default ones
    pub fn service_key(&self) -> Option<&str> {
        match self {
            Key::Type(_, _) | Key::Trait(_) => None,
            Key::TypeKeyed(_, _, key) | Key::TraitKeyed(_, key) => Some(key),
        }
    }

    /// Whether this key carries a service key
    pub fn is_keyed(&self) -> bool {
        self.service_key().is_some()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service_key() {
            Some(key) => write!(f, "{} [key: {}]", self.display_name(), key),
            None => f.write_str(self.display_name()),
        }
    }
}

// TypeId-only comparison for concrete types; the name is diagnostic
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            (Key::TypeKeyed(a, _, key_a), Key::TypeKeyed(b, _, key_b)) => a == b && key_a == key_b,
            (Key::TraitKeyed(a, key_a), Key::TraitKeyed(b, key_b)) => a == b && key_a == key_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Key::TypeKeyed(id, _, key) => {
                2u8.hash(state);
                id.hash(state);
                key.hash(state);
            }
            Key::TraitKeyed(name, key) => {
                3u8.hash(state);
                name.hash(state);
                key.hash(state);
            }
        }
    }
}

#[inline]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

#[inline]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}

#[inline]
pub fn keyed_key_of_type<T: 'static>(key: &str) -> Key {
    Key::TypeKeyed(TypeId::of::<T>(), std::any::type_name::<T>(), Arc::from(key))
}

#[inline]
pub fn keyed_key_of_trait<T: ?Sized + 'static>(key: &str) -> Key {
    Key::TraitKeyed(std::any::type_name::<T>(), Arc::from(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Marker {}

    #[test]
    fn keyed_and_default_keys_are_distinct() {
        let mut set = HashSet::new();
        set.insert(key_of_trait::<dyn Marker>());
        set.insert(keyed_key_of_trait::<dyn Marker>("a"));
        set.insert(keyed_key_of_trait::<dyn Marker>("b"));
        set.insert(keyed_key_of_trait::<dyn Marker>("a"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn display_includes_service_key() {
        let key = keyed_key_of_type::<String>("Reporting");
        assert_eq!(key.to_string(), "alloc::string::String [key: Reporting]");
        assert_eq!(key_of_type::<String>().to_string(), "alloc::string::String");
    }
}
