//! Frozen descriptor registry used by the provider.

use std::collections::HashMap;

use crate::descriptors::ServiceDescriptor;
use crate::key::Key;

/// Descriptors in registration order plus a lookup index.
///
/// The index maps each key to its last descriptor, so a later registration
/// for the same key wins. A descriptor's position doubles as its cache slot.
pub(crate) struct Registry {
    descriptors: Vec<ServiceDescriptor>,
    index: HashMap<Key, usize>,
}

impl Registry {
    pub(crate) fn new(descriptors: Vec<ServiceDescriptor>) -> Self {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (slot, descriptor) in descriptors.iter().enumerate() {
            index.insert(descriptor.key().clone(), slot);
        }
        Self { descriptors, index }
    }

    /// Gets the winning descriptor for a key together with its slot
    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<(usize, &ServiceDescriptor)> {
        self.index.get(key).map(|&slot| (slot, &self.descriptors[slot]))
    }

    pub(crate) fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter()
    }
}
