//! Signal fetch seam: PLUGIN rules hand their rendered arguments to an
//! external accessor through [`SignalFetcher`].

use jsonmap_types::MappingValue;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value};

use crate::request::SignalType;

/// Everything an accessor needs to read one signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchRequest {
    pub plugin: String,
    pub function: Option<String>,
    /// Rule arguments with templates already rendered.
    pub args: JsonMap<String, Value>,
    pub facility: String,
    pub key: String,
    pub indices: Vec<usize>,
    pub signal_type: SignalType,
    pub shot: Option<i64>,
    pub run: Option<i64>,
}

pub trait SignalFetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest) -> anyhow::Result<MappingValue>;
}

/// Fetcher used when no accessor is wired in.
pub struct NullFetcher;

impl SignalFetcher for NullFetcher {
    fn fetch(&self, _request: &FetchRequest) -> anyhow::Result<MappingValue> {
        Ok(MappingValue::Empty)
    }
}
