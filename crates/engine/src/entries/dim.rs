use jsonmap_types::{DimAxis, DimRule, MappingError, MappingValue, Scalar};

use super::apply_dtype;
use crate::resolver::Resolution;

pub(crate) fn resolve(rule: &DimRule, key: &str, resolution: &mut Resolution<'_, '_>) -> Result<MappingValue, MappingError> {
    let value = match &rule.axis {
        DimAxis::Range { count, start, step } => {
            MappingValue::from_f64_values((0..*count).map(|position| start + position as f64 * step).collect())
        }
        DimAxis::Values(values) => MappingValue::from_f64_values(values.clone()),
        DimAxis::Probe(reference) => {
            let probed = resolution.reference(key, reference)?;
            MappingValue::Scalar(Scalar::U64(probed.element_count() as u64))
        }
    };
    apply_dtype(key, value, rule.dtype)
}
