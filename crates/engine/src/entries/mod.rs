//! One resolve function per rule kind.

pub(crate) mod custom;
pub(crate) mod dim;
pub(crate) mod expr;
pub(crate) mod offset;
pub(crate) mod plugin;
pub(crate) mod slice;
pub(crate) mod value;

use jsonmap_types::{DataType, MappingError, MappingValue};

/// Casts numeric results to the rule's `dtype`; `Empty` passes through.
pub(crate) fn apply_dtype(key: &str, value: MappingValue, dtype: Option<DataType>) -> Result<MappingValue, MappingError> {
    let Some(dtype) = dtype else {
        return Ok(value);
    };
    if value == MappingValue::Empty {
        return Ok(value);
    }
    value
        .cast(dtype)
        .ok_or_else(|| MappingError::transform(key, format!("cannot cast non-numeric value to {dtype}")))
}
