//! Resolution requests and path normalization.
//!
//! A request path is `schema/seg/.../leaf`. The first segment selects the
//! schema; the rest is matched against registry keys after numeric segments
//! are replaced by `#` placeholders.

use std::fmt;

use jsonmap_types::MappingError;
use jsonmap_util::{PLACEHOLDER, is_index_segment, is_placeholder, join_segments, split_segments};
use serde::Serialize;

/// Index list meaning "no indices".
const NO_INDICES_SENTINEL: i64 = -1;

/// Trailing segments that may be stripped once when the exact key is absent.
const SIGNAL_SUFFIXES: [(&str, SignalType); 2] = [("data", SignalType::Data), ("time", SignalType::Time)];

/// Which part of a signal was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    #[default]
    Default,
    Data,
    Time,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Default => "default",
            SignalType::Data => "data",
            SignalType::Time => "time",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolution request from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingRequest {
    pub facility: String,
    pub path: String,
    pub indices: Vec<i64>,
    pub dd_version: Option<String>,
    pub experiment: Option<String>,
    pub shot: Option<i64>,
    pub run: Option<i64>,
}

impl MappingRequest {
    pub fn new(facility: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            facility: facility.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_indices(mut self, indices: impl Into<Vec<i64>>) -> Self {
        self.indices = indices.into();
        self
    }

    pub fn with_shot(mut self, shot: i64) -> Self {
        self.shot = Some(shot);
        self
    }

    pub fn with_run(mut self, run: i64) -> Self {
        self.run = Some(run);
        self
    }

    pub fn with_experiment(mut self, experiment: impl Into<String>) -> Self {
        self.experiment = Some(experiment.into());
        self
    }

    pub fn with_dd_version(mut self, dd_version: impl Into<String>) -> Self {
        self.dd_version = Some(dd_version.into());
        self
    }

    /// Splits the path into schema and registry key and binds indices.
    ///
    /// Numeric segments become `#` and contribute their value as an index.
    /// A literal `#` segment takes the next caller index. Caller indices not
    /// consumed by the path are appended for rules that read them later.
    pub fn normalize(&self) -> Result<NormalizedPath, MappingError> {
        let mut caller_indices = caller_indices(&self.indices)?.into_iter();
        let segments = split_segments(&self.path);
        let Some((schema, rest)) = segments.split_first() else {
            return Err(MappingError::invalid_request("request path is empty"));
        };
        if rest.is_empty() {
            return Err(MappingError::invalid_request(format!(
                "request path '{}' names schema '{schema}' but no entry",
                self.path
            )));
        }

        let mut key_segments = Vec::with_capacity(rest.len());
        let mut indices = Vec::new();
        for segment in rest {
            if is_index_segment(segment) {
                let index = segment
                    .parse::<usize>()
                    .map_err(|_| MappingError::invalid_request(format!("index segment '{segment}' is out of range")))?;
                indices.push(index);
                key_segments.push(PLACEHOLDER);
            } else if is_placeholder(segment) {
                let index = caller_indices.next().ok_or_else(|| {
                    MappingError::invalid_request(format!("placeholder in '{}' has no matching index", self.path))
                })?;
                indices.push(index);
                key_segments.push(PLACEHOLDER);
            } else {
                key_segments.push(*segment);
            }
        }
        indices.extend(caller_indices);

        Ok(NormalizedPath {
            schema: schema.to_string(),
            key: join_segments(&key_segments),
            indices,
            signal_type: SignalType::Default,
        })
    }
}

fn caller_indices(indices: &[i64]) -> Result<Vec<usize>, MappingError> {
    if indices == [NO_INDICES_SENTINEL] {
        return Ok(Vec::new());
    }
    indices
        .iter()
        .map(|index| {
            usize::try_from(*index).map_err(|_| MappingError::invalid_request(format!("negative index {index} in request")))
        })
        .collect()
}

/// A request path split into schema, registry key and bound indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub schema: String,
    pub key: String,
    pub indices: Vec<usize>,
    pub signal_type: SignalType,
}

impl NormalizedPath {
    /// The path with a trailing `data`/`time` segment stripped, once.
    pub fn fallback(&self) -> Option<NormalizedPath> {
        if self.signal_type != SignalType::Default {
            return None;
        }
        let (parent, last) = self.key.rsplit_once('/')?;
        let (_, signal_type) = SIGNAL_SUFFIXES.iter().find(|(suffix, _)| *suffix == last)?;
        Some(NormalizedPath {
            schema: self.schema.clone(),
            key: parent.to_string(),
            indices: self.indices.clone(),
            signal_type: *signal_type,
        })
    }
}
