use jsonmap_types::{MappingError, MappingValue, OffsetRule};

use crate::resolver::Resolution;

pub(crate) fn resolve(rule: &OffsetRule, key: &str, resolution: &mut Resolution<'_, '_>) -> Result<MappingValue, MappingError> {
    let wrapped = resolution.reference(key, &rule.variable)?;
    if wrapped.is_empty() {
        return Err(MappingError::transform(
            key,
            format!("wrapped entry '{}' produced no data", rule.variable),
        ));
    }
    wrapped
        .offset(rule.offset)
        .ok_or_else(|| MappingError::transform(key, format!("wrapped entry '{}' is not numeric", rule.variable)))
}
