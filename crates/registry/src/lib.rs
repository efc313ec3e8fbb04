//! Mapping registry: configuration, facility manifests and the cached,
//! per-schema entry registries built from them.
//!
//! Files are laid out as `<root>/<facility>/<dd_version>/mappings.cfg.json`;
//! the manifest names each schema's globals and mapping files relative to
//! its own directory.

pub mod config;
pub mod factory;
pub mod handler;
pub mod loader;
pub mod manifest;
pub mod store;

pub use config::{CONFIG_PATH_ENV, DD_VERSION_ENV, DEFAULT_DD_VERSION, MAPPING_DIR_ENV, MappingConfig, default_config_path};
pub use factory::{MAX_DIM_COUNT, RuleDeclaration, build_entry, decode_entries, normalize_key};
pub use handler::MappingHandler;
pub use loader::{load_facility, read_json_file};
pub use manifest::{FacilityManifest, MANIFEST_FILE_NAME, MappingFiles, SchemaFiles};
pub use store::{EntryRegistry, FacilityMappingStore, SchemaMappings};
