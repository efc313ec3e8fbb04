//! Shared helpers for the JSON mapping crates.
//!
//! - `path_processing`: filesystem path helpers (tilde expansion)
//! - `path_segments`: splitting, joining and classifying `/`-separated
//!   mapping paths

pub mod path_processing;
pub mod path_segments;

pub use path_processing::{expand_tilde, resolve_relative};
pub use path_segments::{PLACEHOLDER, is_index_segment, is_placeholder, join_segments, split_segments};
