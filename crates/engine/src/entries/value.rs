use jsonmap_types::{GlobalAttributes, MappingError, MappingValue, ValueRule, ValueSource};
use serde_json::Value;
use tracing::debug;

use super::apply_dtype;

pub(crate) fn resolve(rule: &ValueRule, key: &str, globals: &GlobalAttributes) -> Result<MappingValue, MappingError> {
    let value = match &rule.source {
        ValueSource::Literal(literal) => convert(key, literal)?,
        ValueSource::Global(path) => match globals.get(path) {
            Some(global) => convert(key, global)?,
            None => {
                debug!(key = %key, global = %path, "global attribute not set");
                MappingValue::Empty
            }
        },
    };
    apply_dtype(key, value, rule.dtype)
}

fn convert(key: &str, value: &Value) -> Result<MappingValue, MappingError> {
    MappingValue::from_json(value)
        .ok_or_else(|| MappingError::transform(key, "value is not a scalar, flat numeric array or string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonmap_types::{DataType, NumericArray, Scalar};
    use serde_json::json;

    fn globals() -> GlobalAttributes {
        GlobalAttributes::new(json!({"machine": {"coils": [4, 8]}}).as_object().cloned().unwrap_or_default())
    }

    fn rule(source: ValueSource, dtype: Option<DataType>) -> ValueRule {
        ValueRule { source, dtype }
    }

    #[test]
    fn literals_and_globals() {
        let literal = rule(ValueSource::Literal(json!(10.0)), None);
        assert_eq!(resolve(&literal, "ip", &globals()).expect("literal"), MappingValue::from(10.0));

        let global = rule(ValueSource::Global("machine.coils".into()), None);
        assert_eq!(
            resolve(&global, "coils", &globals()).expect("global"),
            MappingValue::Array(NumericArray::I64(vec![4, 8]))
        );

        let indexed = rule(ValueSource::Global("machine.coils[1]".into()), Some(DataType::Int));
        assert_eq!(resolve(&indexed, "coil", &globals()).expect("indexed"), MappingValue::Scalar(Scalar::I32(8)));
    }

    #[test]
    fn missing_global_is_empty() {
        let missing = rule(ValueSource::Global("machine.loops".into()), Some(DataType::Double));
        assert_eq!(resolve(&missing, "loops", &globals()).expect("missing"), MappingValue::Empty);
    }

    #[test]
    fn unrepresentable_values_fail() {
        let object = rule(ValueSource::Literal(json!({"a": 1})), None);
        assert!(matches!(resolve(&object, "a", &globals()), Err(MappingError::Transform { .. })));

        let text = rule(ValueSource::Literal(json!("P1")), Some(DataType::Float));
        assert!(matches!(resolve(&text, "name", &globals()), Err(MappingError::Transform { .. })));
    }
}
