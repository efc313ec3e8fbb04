//! Mapping handler: owns configuration and the per-facility cache.
//!
//! Facilities load lazily on first use and stay cached until [`MappingHandler::reset`].
//! A failed load commits nothing, so the next request retries from disk.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use jsonmap_types::{GlobalAttributes, MappingError};
use tracing::{debug, info, warn};

use crate::{
    config::MappingConfig,
    loader::load_facility,
    store::{EntryRegistry, FacilityMappingStore},
};

#[derive(Debug, Default)]
pub struct MappingHandler {
    config: MappingConfig,
    machines: HashMap<String, FacilityMappingStore>,
    initialised: bool,
    load_count: usize,
}

impl MappingHandler {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            config,
            machines: HashMap::new(),
            initialised: false,
            load_count: 0,
        }
    }

    /// Changes the mapping root. Takes effect for facilities not yet loaded.
    pub fn set_root_directory(&mut self, root: impl Into<PathBuf>) {
        self.config.root_directory = Some(root.into());
    }

    pub fn set_dd_version(&mut self, dd_version: impl Into<String>) {
        self.config.dd_version = dd_version.into();
    }

    /// Marks the handler ready. A no-op once initialised; fails without a root
    /// directory.
    pub fn init(&mut self) -> Result<(), MappingError> {
        if self.initialised || !self.machines.is_empty() {
            debug!("mapping handler already initialised");
            return Ok(());
        }
        let root = self
            .config
            .root_directory
            .as_deref()
            .ok_or_else(|| MappingError::configuration("mapping root directory is not set"))?;
        if !root.is_dir() {
            return Err(MappingError::configuration_at(root, "mapping root directory does not exist"));
        }
        info!(root = %root.display(), dd_version = %self.config.dd_version, "mapping handler initialised");
        self.initialised = true;
        Ok(())
    }

    /// Drops every loaded facility and the initialised flag; configuration is kept.
    pub fn reset(&mut self) {
        debug!(facility_count = self.machines.len(), "resetting mapping handler");
        self.machines.clear();
        self.initialised = false;
    }

    /// Returns the globals and entries for `facility`/`schema`, loading the
    /// facility on first access.
    pub fn resolve_registry(&mut self, facility: &str, schema: &str) -> Result<(&GlobalAttributes, &EntryRegistry), MappingError> {
        validate_facility_name(facility)?;
        self.init()?;

        if !self.machines.contains_key(facility) {
            self.load(facility)?;
        }
        let store = self
            .machines
            .get(facility)
            .ok_or_else(|| MappingError::lookup(format!("facility '{facility}' is not loaded")))?;

        let mappings = store
            .schema(schema)
            .ok_or_else(|| MappingError::lookup(format!("no mappings for schema '{schema}' in facility '{facility}'")))?;
        if mappings.entries.is_empty() {
            return Err(MappingError::lookup(format!(
                "schema '{schema}' in facility '{facility}' has no mapping entries"
            )));
        }
        Ok((&mappings.globals, &mappings.entries))
    }

    fn load(&mut self, facility: &str) -> Result<(), MappingError> {
        let root = self
            .config
            .root_directory
            .clone()
            .ok_or_else(|| MappingError::configuration("mapping root directory is not set"))?;
        self.load_count += 1;
        match load_facility(&root, facility, &self.config.dd_version) {
            Ok(store) => {
                info!(
                    facility = %facility,
                    manifest = %store.manifest().path().display(),
                    schema_count = store.schema_names().count(),
                    entry_count = store.entry_count(),
                    "facility mappings cached"
                );
                self.machines.insert(facility.to_string(), store);
                Ok(())
            }
            Err(error) => {
                warn!(facility = %facility, error = %error, "facility load failed");
                Err(error)
            }
        }
    }

    /// A loaded facility, if any.
    pub fn facility(&self, facility: &str) -> Option<&FacilityMappingStore> {
        self.machines.get(facility)
    }

    /// Number of facility loads attempted since construction.
    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn loaded_facilities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.machines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn root_directory(&self) -> Option<&Path> {
        self.config.root_directory.as_deref()
    }

    pub fn dd_version(&self) -> &str {
        &self.config.dd_version
    }
}

fn validate_facility_name(facility: &str) -> Result<(), MappingError> {
    let trimmed = facility.trim();
    if trimmed.is_empty() {
        return Err(MappingError::invalid_request("facility name is empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed.contains("..") {
        return Err(MappingError::invalid_request(format!("invalid facility name '{facility}'")));
    }
    Ok(())
}
