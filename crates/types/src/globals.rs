//! Schema-scoped global attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Shared constants for one schema of one facility.
///
/// Loaded from the schema's globals file next to its mapping rules and
/// immutable afterwards. Rules that need contextual parameters (plugin
/// arguments, named constants) read them from here at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalAttributes(JsonMap<String, Value>);

impl GlobalAttributes {
    pub fn new(attributes: JsonMap<String, Value>) -> Self {
        Self(attributes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &JsonMap<String, Value> {
        &self.0
    }

    /// Looks up a value by a dot path with optional numeric indices.
    ///
    /// Supports `name`, `machine.coils` and `coils[2].turns`. Returns `None`
    /// when a segment is missing, applied to the wrong JSON type, or carries
    /// a malformed index.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.trim().split('.').filter(|segment| !segment.is_empty());
        let (first_key, first_indices) = split_indices(segments.next()?)?;
        let mut current = self.0.get(first_key)?;
        for index in first_indices {
            current = current.get(index)?;
        }
        for segment in segments {
            let (key, indices) = split_indices(segment)?;
            if !key.is_empty() {
                current = current.get(key)?;
            }
            for index in indices {
                current = current.get(index)?;
            }
        }
        Some(current)
    }
}

impl From<JsonMap<String, Value>> for GlobalAttributes {
    fn from(value: JsonMap<String, Value>) -> Self {
        Self(value)
    }
}

/// Splits `name[1][2]` into `("name", [1, 2])`.
///
/// `None` when a bracket is unterminated, holds anything but a non-negative
/// integer, or is followed by stray text.
pub fn split_indices(segment: &str) -> Option<(&str, Vec<usize>)> {
    let key_end = segment.find('[').unwrap_or(segment.len());
    let key = &segment[..key_end];
    let mut indices = Vec::new();
    let mut rest = &segment[key_end..];
    while !rest.is_empty() {
        let open = rest.strip_prefix('[')?;
        let close = open.find(']')?;
        indices.push(open[..close].trim().parse::<usize>().ok()?);
        rest = &open[close + 1..];
    }
    Some((key, indices))
}
