//! Merged table of endpoint descriptors.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use thiserror::Error;

use super::normalizer::Failure;
use super::{EndpointDescriptor, OperationKey};

/// One domain's slice of the registry.
#[derive(Debug, Clone)]
pub struct EndpointTable {
    domain: &'static str,
    descriptors: Vec<EndpointDescriptor>,
}

impl EndpointTable {
    /// Table contributed by `domain`.
    #[must_use]
    pub fn new(domain: &'static str, descriptors: Vec<EndpointDescriptor>) -> Self {
        Self {
            domain,
            descriptors,
        }
    }

    /// Contributing domain name.
    #[must_use]
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Descriptors in declaration order.
    #[must_use]
    pub fn descriptors(&self) -> &[EndpointDescriptor] {
        &self.descriptors
    }
}

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two tables (or one table twice) declared the same key.
    #[error("operation `{key}` is declared by both `{first}` and `{second}`")]
    DuplicateKey {
        /// Offending key.
        key: OperationKey,
        /// Domain that declared it first.
        first: &'static str,
        /// Domain that declared it again.
        second: &'static str,
    },
}

/// Lookup table from operation key to descriptor.
///
/// Assembled once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    descriptors: HashMap<OperationKey, (&'static str, EndpointDescriptor)>,
}

impl EndpointRegistry {
    /// Merge per-domain tables.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] when a key appears more than
    /// once across the supplied tables.
    pub fn assemble<I>(tables: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = EndpointTable>,
    {
        let mut descriptors: HashMap<OperationKey, (&'static str, EndpointDescriptor)> = HashMap::new();
        for table in tables {
            let domain = table.domain;
            for descriptor in table.descriptors {
                match descriptors.entry(descriptor.key()) {
                    Entry::Occupied(existing) => {
                        return Err(RegistryError::DuplicateKey {
                            key: descriptor.key(),
                            first: existing.get().0,
                            second: domain,
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((domain, descriptor));
                    }
                }
            }
        }
        Ok(Self { descriptors })
    }

    /// Registry covering every marketplace operation.
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError`] if the built-in tables overlap.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::assemble(crate::endpoints::standard_tables())
    }

    /// Descriptor for `key`, if registered.
    #[must_use]
    pub fn get(&self, key: OperationKey) -> Option<&EndpointDescriptor> {
        self.descriptors.get(&key).map(|(_, descriptor)| descriptor)
    }

    /// Domain that contributed `key`.
    #[must_use]
    pub fn domain_of(&self, key: OperationKey) -> Option<&'static str> {
        self.descriptors.get(&key).map(|(domain, _)| *domain)
    }

    pub(crate) fn lookup(&self, key: OperationKey) -> Result<&EndpointDescriptor, Failure> {
        self.get(key).ok_or(Failure::UnknownOperation)
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered keys in stable order.
    #[must_use]
    pub fn keys(&self) -> Vec<OperationKey> {
        let mut keys: Vec<_> = self.descriptors.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
