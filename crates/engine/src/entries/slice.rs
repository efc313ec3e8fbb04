//! Python-style selection from a wrapped array.

use jsonmap_types::{MappingError, MappingValue, NumericArray, SliceBound, SliceRule, SliceSelector};

use crate::resolver::Resolution;

pub(crate) fn resolve(rule: &SliceRule, key: &str, resolution: &mut Resolution<'_, '_>) -> Result<MappingValue, MappingError> {
    let wrapped = resolution.reference(key, &rule.variable)?;
    let array = match wrapped {
        MappingValue::Array(array) => array,
        MappingValue::Empty => {
            return Err(MappingError::transform(
                key,
                format!("wrapped entry '{}' produced no data", rule.variable),
            ));
        }
        MappingValue::Scalar(_) | MappingValue::Text(_) => {
            return Err(MappingError::transform(
                key,
                format!("wrapped entry '{}' is not an array", rule.variable),
            ));
        }
    };

    let indices = &resolution.context().indices;
    if rule.selector.placeholder_count() > indices.len() {
        return Err(MappingError::transform(
            key,
            format!(
                "slice needs {} index(es) but the request bound {}",
                rule.selector.placeholder_count(),
                indices.len()
            ),
        ));
    }
    let mut indices = indices.iter().copied();
    let mut bind = |bound: SliceBound| -> Result<i64, MappingError> {
        match bound {
            SliceBound::Literal(value) => Ok(value),
            SliceBound::Placeholder => indices
                .next()
                .and_then(|index| i64::try_from(index).ok())
                .ok_or_else(|| MappingError::transform(key, format!("index out of range for slice of '{}'", rule.variable))),
        }
    };

    match rule.selector {
        SliceSelector::Index(index) => {
            let position = bind(index)?;
            select_one(&array, position).ok_or_else(|| {
                MappingError::transform(key, format!("index {position} is out of range for length {}", array.len()))
            })
        }
        SliceSelector::Range { start, stop, step } => {
            let length = array.len();
            let start = start.map(&mut bind).transpose()?.map_or(0, |value| clamp(value, length));
            let stop = stop.map(&mut bind).transpose()?.map_or(length, |value| clamp(value, length));
            Ok(MappingValue::Array(array.strided(start, stop, step)))
        }
    }
}

fn select_one(array: &NumericArray, position: i64) -> Option<MappingValue> {
    let length = i64::try_from(array.len()).ok()?;
    let position = if position < 0 { length + position } else { position };
    let position = usize::try_from(position).ok()?;
    array.get(position).map(MappingValue::Scalar)
}

/// Resolves a possibly negative bound into `0..=length`.
fn clamp(value: i64, length: usize) -> usize {
    if value < 0 {
        length.saturating_sub(value.unsigned_abs() as usize)
    } else {
        (value as usize).min(length)
    }
}
