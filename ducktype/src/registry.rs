//! Adapter type registry
//!
//! Process-wide, append-only store of synthesised adapter types keyed by
//! (base type identity, ordered capability identities). The get-or-create
//! path holds the key's map entry while synthesising, so concurrent first
//! requests for one key observe a single stored type.

use crate::adapter::AdapterType;
use crate::error::DuckResult;
use crate::interface::{Interface, InterfaceId};
use crate::object::{BaseTypeId, TypeDef};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

static GLOBAL_REGISTRY: Lazy<Arc<AdapterRegistry>> = Lazy::new(|| Arc::new(AdapterRegistry::new()));

/// Identity of an adapter type. Capability order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    pub base: BaseTypeId,
    pub capabilities: Vec<InterfaceId>,
}

impl CompositeKey {
    pub fn new(base: BaseTypeId, capabilities: Vec<InterfaceId>) -> Self {
        Self { base, capabilities }
    }

    pub fn of(base: &TypeDef, capabilities: &[Arc<Interface>]) -> Self {
        Self::new(base.id(), capabilities.iter().map(|c| c.id()).collect())
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base.as_u64())?;
        for capability in &self.capabilities {
            write!(f, ":{}", capability.as_u64())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl RegistryStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
pub struct AdapterRegistry {
    types: DashMap<CompositeKey, Arc<AdapterType>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by default factories.
    pub fn global() -> Arc<AdapterRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    pub fn get(&self, key: &CompositeKey) -> Option<Arc<AdapterType>> {
        self.types.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the stored type for `key`, or runs `synthesize` and stores its
    /// result. A failed synthesis stores nothing.
    pub fn get_or_create<F>(&self, key: CompositeKey, synthesize: F) -> DuckResult<Arc<AdapterType>>
    where
        F: FnOnce() -> DuckResult<AdapterType>,
    {
        if let Some(existing) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("adapter type cache hit for {}", key);
            return Ok(existing);
        }

        match self.types.entry(key) {
            Entry::Occupied(entry) => {
                // Another caller finished synthesis between the lookup and the lock
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let ty = Arc::new(synthesize()?);
                entry.insert(Arc::clone(&ty));
                Ok(ty)
            }
        }
    }

    pub fn contains(&self, key: &CompositeKey) -> bool {
        self.types.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of stored adapter types, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .iter()
            .map(|entry| entry.value().name().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.types.len(),
        }
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}
