//! Facility load: manifest → globals + entry registries, built off to the
//! side and returned whole so a failure never leaves a partial facility.

use std::{fs, io::ErrorKind as IoErrorKind, path::Path};

use indexmap::IndexMap;
use jsonmap_types::{GlobalAttributes, MappingError};
use jsonmap_util::resolve_relative;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    factory::decode_entries,
    manifest::{FacilityManifest, SchemaFiles},
    store::{EntryRegistry, FacilityMappingStore, SchemaMappings},
};

/// Reads and parses a JSON file, classifying every failure as a
/// configuration error.
pub fn read_json_file(path: &Path) -> Result<Value, MappingError> {
    let content = fs::read_to_string(path).map_err(|error| match error.kind() {
        IoErrorKind::NotFound => MappingError::configuration_at(path, "file not found"),
        _ => MappingError::configuration_at(path, error.to_string()),
    })?;
    serde_json::from_str(&content).map_err(|error| MappingError::configuration_at(path, format!("invalid JSON: {error}")))
}

/// Loads every schema a facility's manifest declares.
pub fn load_facility(root: &Path, facility: &str, dd_version: &str) -> Result<FacilityMappingStore, MappingError> {
    let manifest_path = FacilityManifest::location(root, facility, dd_version);
    debug!(facility = %facility, manifest = %manifest_path.display(), "loading facility manifest");
    let manifest = FacilityManifest::load(&manifest_path)?;

    let mut schemas = IndexMap::new();
    for (schema, files) in manifest.schemas() {
        let mappings = load_schema(manifest.base_directory(), schema, files)?;
        info!(
            facility = %facility,
            schema = %schema,
            entry_count = mappings.entries.len(),
            global_count = mappings.globals.len(),
            "schema mappings loaded"
        );
        schemas.insert(schema.clone(), mappings);
    }

    Ok(FacilityMappingStore::new(facility, manifest, schemas))
}

fn load_schema(base_directory: &Path, schema: &str, files: &SchemaFiles) -> Result<SchemaMappings, MappingError> {
    let globals = match files.globals.as_deref() {
        Some(relative) => load_globals(&resolve_relative(base_directory, relative))?,
        None => GlobalAttributes::default(),
    };

    let mut entries = EntryRegistry::new();
    for relative in files.mappings.paths() {
        let path = resolve_relative(base_directory, relative);
        let document = read_json_file(&path)?;
        for entry in decode_entries(schema, &document, &path)? {
            entries
                .insert(entry)
                .map_err(|key| MappingError::configuration_at(&path, format!("duplicate mapping key '{key}'")))?;
        }
    }

    Ok(SchemaMappings { globals, entries })
}

fn load_globals(path: &Path) -> Result<GlobalAttributes, MappingError> {
    match read_json_file(path)? {
        Value::Object(attributes) => Ok(GlobalAttributes::new(attributes)),
        _ => Err(MappingError::configuration_at(path, "globals file must contain a JSON object")),
    }
}
