use jsonmap_types::GlobalAttributes;
use serde_json::{Map as JsonMap, Value};

use crate::request::{MappingRequest, NormalizedPath, SignalType};

/// Request-scoped parameters visible to every rule in one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveContext {
    pub facility: String,
    pub schema: String,
    /// Registry key the request matched.
    pub key: String,
    /// Path as the caller sent it.
    pub request_path: String,
    pub indices: Vec<usize>,
    pub signal_type: SignalType,
    pub dd_version: String,
    pub experiment: Option<String>,
    pub shot: Option<i64>,
    pub run: Option<i64>,
}

impl ResolveContext {
    pub fn new(request: &MappingRequest, path: &NormalizedPath, dd_version: &str) -> Self {
        Self {
            facility: request.facility.clone(),
            schema: path.schema.clone(),
            key: path.key.clone(),
            request_path: request.path.clone(),
            indices: path.indices.clone(),
            signal_type: path.signal_type,
            dd_version: request.dd_version.clone().unwrap_or_else(|| dd_version.to_string()),
            experiment: request.experiment.clone(),
            shot: request.shot,
            run: request.run,
        }
    }

    /// Names available to `{{ ... }}` templates: the schema globals overlaid
    /// with the request fields.
    pub fn template_scope(&self, globals: &GlobalAttributes) -> GlobalAttributes {
        let mut scope: JsonMap<String, Value> = globals.as_map().clone();
        scope.insert("facility".into(), Value::String(self.facility.clone()));
        scope.insert("schema".into(), Value::String(self.schema.clone()));
        scope.insert("path".into(), Value::String(self.request_path.clone()));
        scope.insert("key".into(), Value::String(self.key.clone()));
        scope.insert("indices".into(), Value::from(self.indices.clone()));
        scope.insert("signal_type".into(), Value::String(self.signal_type.as_str().to_string()));
        scope.insert("dd_version".into(), Value::String(self.dd_version.clone()));
        scope.insert("experiment".into(), self.experiment.clone().map(Value::String).unwrap_or(Value::Null));
        scope.insert("shot".into(), self.shot.map(Value::from).unwrap_or(Value::Null));
        scope.insert("run".into(), self.run.map(Value::from).unwrap_or(Value::Null));
        GlobalAttributes::new(scope)
    }
}
