//! Facility manifest: which files hold each schema's globals and rules.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use jsonmap_types::MappingError;
use serde::{Deserialize, Serialize};

use crate::loader::read_json_file;

/// File name of the manifest inside `<root>/<facility>/<dd_version>/`.
pub const MANIFEST_FILE_NAME: &str = "mappings.cfg.json";

/// One mapping file or several, merged in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingFiles {
    Single(String),
    Many(Vec<String>),
}

impl MappingFiles {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            MappingFiles::Single(path) => vec![path.as_str()],
            MappingFiles::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

/// Files declared for one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFiles {
    /// Globals file; schemas without one get empty global attributes.
    #[serde(default)]
    pub globals: Option<String>,
    pub mappings: MappingFiles,
}

/// Parsed facility manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityManifest {
    path: PathBuf,
    schemas: IndexMap<String, SchemaFiles>,
}

impl FacilityManifest {
    /// Deterministic manifest location for a facility and data-dictionary version.
    pub fn location(root: &Path, facility: &str, dd_version: &str) -> PathBuf {
        root.join(facility).join(dd_version).join(MANIFEST_FILE_NAME)
    }

    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let document = read_json_file(path)?;
        let schemas: IndexMap<String, SchemaFiles> =
            serde_json::from_value(document).map_err(|error| MappingError::configuration_at(path, error.to_string()))?;
        if schemas.is_empty() {
            return Err(MappingError::configuration_at(path, "manifest declares no schemas"));
        }
        Ok(Self {
            path: path.to_path_buf(),
            schemas,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative file names are resolved against.
    pub fn base_directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn schemas(&self) -> &IndexMap<String, SchemaFiles> {
        &self.schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn location_combines_root_facility_and_version() {
        let path = FacilityManifest::location(Path::new("/srv/mappings"), "JET", "3.39.0");
        assert_eq!(path, PathBuf::from("/srv/mappings/JET/3.39.0/mappings.cfg.json"));
    }

    #[test]
    fn parses_single_and_multiple_mapping_files() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join(MANIFEST_FILE_NAME);
        fs::write(
            &path,
            r#"{
                "magnetics": {"globals": "magnetics/globals.json", "mappings": "magnetics/mappings.json"},
                "pf_active": {"mappings": ["pf_active/coils.json", "pf_active/circuits.json"]}
            }"#,
        )
        .expect("write manifest");

        let manifest = FacilityManifest::load(&path).expect("load manifest");
        assert_eq!(manifest.base_directory(), directory.path());
        let magnetics = &manifest.schemas()["magnetics"];
        assert_eq!(magnetics.globals.as_deref(), Some("magnetics/globals.json"));
        assert_eq!(magnetics.mappings.paths(), vec!["magnetics/mappings.json"]);
        let pf_active = &manifest.schemas()["pf_active"];
        assert_eq!(pf_active.globals, None);
        assert_eq!(pf_active.mappings.paths(), vec!["pf_active/coils.json", "pf_active/circuits.json"]);
    }

    #[test]
    fn rejects_empty_and_malformed_manifests() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join(MANIFEST_FILE_NAME);

        fs::write(&path, "{}").expect("write manifest");
        assert!(matches!(FacilityManifest::load(&path), Err(MappingError::Configuration { .. })));

        fs::write(&path, r#"{"magnetics": {"globals": "g.json"}}"#).expect("write manifest");
        assert!(matches!(FacilityManifest::load(&path), Err(MappingError::Configuration { .. })));
    }
}
