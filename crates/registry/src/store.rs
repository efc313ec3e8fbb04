//! Loaded mapping state: per-schema entry registries and facility stores.

use indexmap::IndexMap;
use jsonmap_types::{GlobalAttributes, MappingEntry};

use crate::manifest::FacilityManifest;

/// Entries of one schema keyed by normalized path template.
///
/// Keys are unique; lookups are exact string matches on the template, so
/// callers normalize request paths before asking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryRegistry {
    entries: IndexMap<String, MappingEntry>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning its key back when the key is taken.
    pub fn insert(&mut self, entry: MappingEntry) -> Result<(), String> {
        if self.entries.contains_key(entry.key()) {
            return Err(entry.key().to_string());
        }
        self.entries.insert(entry.key().to_string(), entry);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&MappingEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }
}

/// Globals and entries for one schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMappings {
    pub globals: GlobalAttributes,
    pub entries: EntryRegistry,
}

/// Everything loaded for one facility.
#[derive(Debug, Clone)]
pub struct FacilityMappingStore {
    facility: String,
    manifest: FacilityManifest,
    schemas: IndexMap<String, SchemaMappings>,
}

impl FacilityMappingStore {
    pub fn new(facility: impl Into<String>, manifest: FacilityManifest, schemas: IndexMap<String, SchemaMappings>) -> Self {
        Self {
            facility: facility.into(),
            manifest,
            schemas,
        }
    }

    pub fn facility(&self) -> &str {
        &self.facility
    }

    pub fn manifest(&self) -> &FacilityManifest {
        &self.manifest
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaMappings> {
        self.schemas.get(name)
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Total number of entries across schemas.
    pub fn entry_count(&self) -> usize {
        self.schemas.values().map(|mappings| mappings.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonmap_types::{EntryKind, ValueRule, ValueSource};
    use serde_json::json;

    fn value_entry(key: &str, value: serde_json::Value) -> MappingEntry {
        MappingEntry::new(
            key,
            EntryKind::Value(ValueRule {
                source: ValueSource::Literal(value),
                dtype: None,
            }),
        )
    }

    #[test]
    fn duplicate_keys_are_refused() {
        let mut registry = EntryRegistry::new();
        registry.insert(value_entry("coil/#/current", json!(1))).expect("first insert");
        assert_eq!(registry.insert(value_entry("coil/#/current", json!(2))), Err("coil/#/current".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookups_are_exact() {
        let mut registry = EntryRegistry::new();
        registry.insert(value_entry("coil/#/current", json!(1))).expect("insert");
        assert!(registry.contains("coil/#/current"));
        assert!(registry.get("coil/3/current").is_none());
        assert!(registry.get("coil/#/current/data").is_none());
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["coil/#/current"]);
    }
}
