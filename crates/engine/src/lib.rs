//! # JSON mapping engine
//!
//! Resolves schema paths such as `magnetics/coil/3/current` to values by
//! executing the declarative mapping rules loaded for a facility.
//!
//! ## Flow
//!
//! 1. [`MappingRequest::normalize`] splits the path into schema and registry
//!    key, replacing index segments with `#` and binding the index list.
//! 2. [`MappingService`] asks its [`jsonmap_registry::MappingHandler`] for the
//!    schema registry, loading the facility on first use.
//! 3. The entry is looked up by exact key, falling back once to the key
//!    without a trailing `data`/`time` segment.
//! 4. [`EntryResolver`] executes the entry, resolving wrapped entries by key.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jsonmap_engine::{MappingRequest, MappingService};
//! use jsonmap_registry::MappingConfig;
//!
//! let mut service = MappingService::from_config(MappingConfig::default().with_root_directory("/srv/mappings"));
//! let request = MappingRequest::new("JET", "magnetics/coil/3/current").with_shot(99_000);
//! let value = service.resolve(&request)?;
//! println!("{}", serde_json::to_string(&value)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! External signal access and site-specific transforms plug in through
//! [`SignalFetcher`] and [`CustomHook`].

pub mod context;
pub mod custom;
mod entries;
pub mod fetch;
pub mod request;
pub mod resolver;
pub mod service;
pub mod template;

pub use context::ResolveContext;
pub use custom::{CustomHook, CustomHookRegistry, CustomInvocation};
pub use fetch::{FetchRequest, NullFetcher, SignalFetcher};
pub use request::{MappingRequest, NormalizedPath, SignalType};
pub use resolver::{DEFAULT_MAX_DEPTH, EntryResolver, ResolveScope};
pub use service::MappingService;
