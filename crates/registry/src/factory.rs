//! Entry factory: turns mapping-file declarations into typed entries.
//!
//! A mapping file is a JSON array of declarations. Each declaration carries
//! `key` (path template), `type` (rule kind) and the kind's parameters:
//!
//! ```json
//! [
//!   {"key": "coil/#/current_raw", "type": "PLUGIN", "plugin": "UDA", "args": {"signal": "AMC_PLASMA CURRENT"}},
//!   {"key": "coil/#/current", "type": "OFFSET", "variable": "coil/#/current_raw", "offset": 2.5}
//! ]
//! ```

use std::path::Path;

use indexmap::IndexMap;
use jsonmap_types::{
    CustomRule, DataType, DimAxis, DimRule, EntryKind, ExprOperand, ExprRule, Expression, MappingEntry, MappingError, MappingKind,
    OffsetRule, PluginRule, SliceRule, SliceSelector, ValueRule, ValueSource,
};
use jsonmap_util::{PLACEHOLDER, is_index_segment, join_segments, split_segments};
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value};

/// Largest element count a DIM `count` range may declare.
pub const MAX_DIM_COUNT: usize = 1 << 24;

/// Raw declaration as it appears in a mapping file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDeclaration {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub parameters: JsonMap<String, Value>,
}

/// Normalizes a rule key or reference into registry form.
///
/// Empty segments are dropped, a leading segment equal to the schema name is
/// stripped, and literal index segments become `#` so declared keys match the
/// way request paths are normalized.
pub fn normalize_key(schema: &str, raw: &str) -> String {
    let mut segments = split_segments(raw);
    if segments.len() > 1 && segments.first() == Some(&schema) {
        segments.remove(0);
    }
    let segments: Vec<&str> = segments
        .into_iter()
        .map(|segment| if is_index_segment(segment) { PLACEHOLDER } else { segment })
        .collect();
    join_segments(&segments)
}

/// Decodes every declaration of one mapping document.
pub fn decode_entries(schema: &str, document: &Value, source: &Path) -> Result<Vec<MappingEntry>, MappingError> {
    let Value::Array(declarations) = document else {
        return Err(MappingError::configuration_at(source, "mapping file must contain a JSON array"));
    };

    declarations
        .iter()
        .enumerate()
        .map(|(position, declaration)| {
            let declaration = RuleDeclaration::deserialize(declaration).map_err(|error| {
                MappingError::configuration_at(source, format!("declaration #{position}: {error}"))
            })?;
            let key = declaration.key.clone();
            build_entry(schema, declaration)
                .map_err(|message| MappingError::configuration_at(source, format!("declaration #{position} ('{key}'): {message}")))
        })
        .collect()
}

/// Builds one entry, dispatching on the declaration's `type`.
pub fn build_entry(schema: &str, declaration: RuleDeclaration) -> Result<MappingEntry, String> {
    let key = normalize_key(schema, &declaration.key);
    if key.is_empty() {
        return Err("key is empty".to_string());
    }
    let parameters = declaration.parameters;
    let kind = match declaration.kind.parse::<MappingKind>()? {
        MappingKind::Value => value_rule(parameters)?,
        MappingKind::Plugin => plugin_rule(parameters)?,
        MappingKind::Dim => dim_rule(schema, parameters)?,
        MappingKind::Slice => slice_rule(schema, parameters)?,
        MappingKind::Expr => expr_rule(schema, parameters)?,
        MappingKind::Custom => custom_rule(schema, parameters)?,
        MappingKind::Offset => offset_rule(schema, parameters)?,
    };
    Ok(MappingEntry::new(key, kind))
}

fn value_rule(mut parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let dtype = take_dtype(&mut parameters)?;
    let source = match (parameters.remove("value"), take_string(&mut parameters, "global")?) {
        (Some(value), None) => ValueSource::Literal(value),
        (None, Some(global)) => ValueSource::Global(global),
        (Some(_), Some(_)) => return Err("'value' and 'global' are mutually exclusive".to_string()),
        (None, None) => return Err("requires 'value' or 'global'".to_string()),
    };
    reject_unknown(&parameters)?;
    Ok(EntryKind::Value(ValueRule { source, dtype }))
}

fn plugin_rule(parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let rule: PluginRule = serde_json::from_value(Value::Object(parameters)).map_err(|error| error.to_string())?;
    if rule.plugin.trim().is_empty() {
        return Err("'plugin' cannot be empty".to_string());
    }
    Ok(EntryKind::Plugin(rule))
}

fn dim_rule(schema: &str, mut parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let dtype = take_dtype(&mut parameters)?;
    let axis = if let Some(probe) = take_string(&mut parameters, "probe")? {
        DimAxis::Probe(normalize_key(schema, &probe))
    } else if let Some(values) = parameters.remove("values") {
        let values: Vec<f64> =
            serde_json::from_value(values).map_err(|error| format!("'values' must be an array of numbers: {error}"))?;
        DimAxis::Values(values)
    } else if let Some(count) = parameters.remove("count") {
        let count = count.as_u64().ok_or("'count' must be a non-negative integer")?;
        let count = usize::try_from(count)
            .ok()
            .filter(|count| *count <= MAX_DIM_COUNT)
            .ok_or_else(|| format!("'count' {count} exceeds the maximum of {MAX_DIM_COUNT}"))?;
        let start = take_number(&mut parameters, "start")?.unwrap_or(0.0);
        let step = take_number(&mut parameters, "step")?.unwrap_or(1.0);
        DimAxis::Range { count, start, step }
    } else {
        return Err("requires one of 'count', 'values' or 'probe'".to_string());
    };
    reject_unknown(&parameters)?;
    Ok(EntryKind::Dim(DimRule { axis, dtype }))
}

fn slice_rule(schema: &str, mut parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let variable = take_string(&mut parameters, "variable")?.ok_or("requires 'variable'")?;
    let selector = match parameters.remove("slice") {
        Some(Value::String(text)) => SliceSelector::parse(&text)?,
        Some(Value::Number(number)) => SliceSelector::parse(&number.to_string())?,
        Some(_) => return Err("'slice' must be a string or an integer".to_string()),
        None => return Err("requires 'slice'".to_string()),
    };
    reject_unknown(&parameters)?;
    Ok(EntryKind::Slice(SliceRule {
        variable: normalize_key(schema, &variable),
        selector,
    }))
}

fn expr_rule(schema: &str, mut parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let source = take_string(&mut parameters, "expression")?.ok_or("requires 'expression'")?;
    let expression = Expression::parse(&source).map_err(|error| format!("invalid expression '{source}': {error}"))?;
    let operands: IndexMap<String, ExprOperand> = match parameters.remove("parameters") {
        Some(value) => serde_json::from_value(value)
            .map_err(|error| format!("'parameters' must map names to entry keys or numbers: {error}"))?,
        None => IndexMap::new(),
    };
    reject_unknown(&parameters)?;

    let undeclared: Vec<&str> = expression
        .variables()
        .into_iter()
        .filter(|name| !operands.contains_key(*name))
        .collect();
    if !undeclared.is_empty() {
        return Err(format!("expression uses undeclared parameter(s): {}", undeclared.join(", ")));
    }

    let parameters = operands
        .into_iter()
        .map(|(name, operand)| match operand {
            ExprOperand::Reference(key) => (name, ExprOperand::Reference(normalize_key(schema, &key))),
            literal => (name, literal),
        })
        .collect();
    Ok(EntryKind::Expr(ExprRule { expression, parameters }))
}

fn custom_rule(schema: &str, parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let mut rule: CustomRule = serde_json::from_value(Value::Object(parameters)).map_err(|error| error.to_string())?;
    if rule.name.trim().is_empty() {
        return Err("'name' cannot be empty".to_string());
    }
    rule.variable = rule.variable.map(|variable| normalize_key(schema, &variable));
    Ok(EntryKind::Custom(rule))
}

fn offset_rule(schema: &str, parameters: JsonMap<String, Value>) -> Result<EntryKind, String> {
    let mut rule: OffsetRule = serde_json::from_value(Value::Object(parameters)).map_err(|error| error.to_string())?;
    rule.variable = normalize_key(schema, &rule.variable);
    if rule.variable.is_empty() {
        return Err("'variable' cannot be empty".to_string());
    }
    Ok(EntryKind::Offset(rule))
}

fn take_string(parameters: &mut JsonMap<String, Value>, name: &str) -> Result<Option<String>, String> {
    match parameters.remove(name) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(format!("'{name}' must be a string")),
    }
}

fn take_number(parameters: &mut JsonMap<String, Value>, name: &str) -> Result<Option<f64>, String> {
    match parameters.remove(name) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| format!("'{name}' must be a number")),
    }
}

fn take_dtype(parameters: &mut JsonMap<String, Value>) -> Result<Option<DataType>, String> {
    take_string(parameters, "dtype")?.map(|text| text.parse::<DataType>()).transpose()
}

fn reject_unknown(parameters: &JsonMap<String, Value>) -> Result<(), String> {
    if parameters.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = parameters.keys().map(String::as_str).collect();
    Err(format!("unexpected parameter(s): {}", names.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonmap_types::SliceBound;
    use serde_json::json;
    use std::path::PathBuf;

    fn source() -> PathBuf {
        PathBuf::from("/srv/mappings/JET/3.39.0/magnetics/mappings.json")
    }

    fn decode(document: Value) -> Result<Vec<MappingEntry>, MappingError> {
        decode_entries("magnetics", &document, &source())
    }

    fn decode_one(declaration: Value) -> MappingEntry {
        let mut entries = decode(json!([declaration])).expect("decode declaration");
        entries.remove(0)
    }

    #[test]
    fn normalizes_keys() {
        assert_eq!(normalize_key("magnetics", "magnetics/coil/3/current"), "coil/#/current");
        assert_eq!(normalize_key("magnetics", "/coil/#/current/"), "coil/#/current");
        assert_eq!(normalize_key("magnetics", "magnetics"), "magnetics");
        assert_eq!(normalize_key("magnetics", "flux_loop//flux"), "flux_loop/flux");
    }

    #[test]
    fn decodes_value_rules() {
        let entry = decode_one(json!({"key": "magnetics/ids_properties/homogeneous_time", "type": "VALUE", "value": 1}));
        assert_eq!(entry.key(), "ids_properties/homogeneous_time");
        assert_eq!(
            entry.kind(),
            &EntryKind::Value(ValueRule {
                source: ValueSource::Literal(json!(1)),
                dtype: None,
            })
        );

        let entry = decode_one(json!({"key": "coil/#/turns", "type": "value", "global": "coils.turns", "dtype": "int"}));
        assert_eq!(
            entry.kind(),
            &EntryKind::Value(ValueRule {
                source: ValueSource::Global("coils.turns".into()),
                dtype: Some(DataType::Int),
            })
        );
    }

    #[test]
    fn decodes_offset_and_normalizes_reference() {
        let entry = decode_one(json!({
            "key": "coil/#/current",
            "type": "OFFSET",
            "variable": "magnetics/coil/#/current_raw",
            "offset": 2.5
        }));
        assert_eq!(entry.variable_reference(), Some("coil/#/current_raw"));
        assert_eq!(
            entry.kind(),
            &EntryKind::Offset(OffsetRule {
                variable: "coil/#/current_raw".into(),
                offset: 2.5,
            })
        );
    }

    #[test]
    fn decodes_dimension_variants() {
        let range = decode_one(json!({"key": "time", "type": "DIM", "count": 4, "start": 0.5, "step": 0.25}));
        assert_eq!(
            range.kind(),
            &EntryKind::Dim(DimRule {
                axis: DimAxis::Range {
                    count: 4,
                    start: 0.5,
                    step: 0.25,
                },
                dtype: None,
            })
        );

        let probe = decode_one(json!({"key": "coil/#/element/count", "type": "DIMENSION", "probe": "coil/#/element"}));
        assert_eq!(probe.variable_reference(), Some("coil/#/element"));

        let values = decode_one(json!({"key": "grid/r", "type": "DIM", "values": [1.0, 1.5, 2.0], "dtype": "float"}));
        assert!(matches!(values.kind(), EntryKind::Dim(DimRule { axis: DimAxis::Values(v), dtype: Some(DataType::Float) }) if v.len() == 3));
    }

    #[test]
    fn dimension_count_is_bounded() {
        let largest = decode_one(json!({"key": "time", "type": "DIM", "count": MAX_DIM_COUNT}));
        assert!(matches!(largest.kind(), EntryKind::Dim(DimRule { axis: DimAxis::Range { count, .. }, .. }) if *count == MAX_DIM_COUNT));

        for count in [json!(MAX_DIM_COUNT + 1), json!(100_000_000_000_000u64), json!(u64::MAX)] {
            let error = decode(json!([{"key": "time", "type": "DIM", "count": count}])).expect_err("oversized count");
            assert!(matches!(error, MappingError::Configuration { .. }));
            assert!(error.to_string().contains("exceeds the maximum"), "{error}");
        }
    }

    #[test]
    fn decodes_slice_and_expression() {
        let slice = decode_one(json!({"key": "coil/#/current", "type": "SLICE", "variable": "coils/currents", "slice": "#"}));
        assert_eq!(
            slice.kind(),
            &EntryKind::Slice(SliceRule {
                variable: "coils/currents".into(),
                selector: SliceSelector::Index(SliceBound::Placeholder),
            })
        );

        let expr = decode_one(json!({
            "key": "ip",
            "type": "EXPR",
            "expression": "-raw * scale",
            "parameters": {"raw": "magnetics/ip_raw", "scale": 1e-3}
        }));
        assert_eq!(expr.references(), vec!["ip_raw"]);
    }

    #[test]
    fn decodes_plugin_and_custom() {
        let plugin = decode_one(json!({
            "key": "flux_loop/#/flux/data",
            "type": "PLUGIN",
            "plugin": "UDA",
            "args": {"signal": "XMC/FLUX/{{ indices[0] }}", "source": "{{ shot }}"}
        }));
        assert!(matches!(plugin.kind(), EntryKind::Plugin(rule) if rule.plugin == "UDA" && rule.args.len() == 2));

        let custom = decode_one(json!({"key": "coil/#/name", "type": "CUSTOM", "name": "reverse", "variable": "coil/#/raw"}));
        assert_eq!(custom.variable_reference(), Some("coil/#/raw"));
    }

    #[test]
    fn rejects_unknown_type() {
        let error = decode(json!([{"key": "a", "type": "SCALE", "factor": 2}])).expect_err("unknown type");
        assert!(matches!(error, MappingError::Configuration { .. }));
        assert!(error.to_string().contains("unknown mapping type"));
    }

    #[test]
    fn rejects_bad_parameters() {
        let cases = [
            json!({"key": "a", "type": "VALUE"}),
            json!({"key": "a", "type": "VALUE", "value": 1, "global": "x"}),
            json!({"key": "a", "type": "VALUE", "value": 1, "extra": true}),
            json!({"key": "a", "type": "OFFSET", "variable": "b"}),
            json!({"key": "a", "type": "OFFSET", "variable": "b", "offset": "2"}),
            json!({"key": "a", "type": "DIM"}),
            json!({"key": "a", "type": "SLICE", "variable": "b", "slice": "x:y"}),
            json!({"key": "a", "type": "EXPR", "expression": "x +"}),
            json!({"key": "a", "type": "EXPR", "expression": "x + y", "parameters": {"x": "b"}}),
            json!({"key": "a", "type": "PLUGIN", "plugin": ""}),
            json!({"key": "a", "type": "VALUE", "value": 1, "dtype": "complex"}),
            json!({"key": "/", "type": "VALUE", "value": 1}),
            json!({"type": "VALUE", "value": 1}),
        ];
        for case in cases {
            let result = decode(json!([case.clone()]));
            assert!(
                matches!(result, Err(MappingError::Configuration { .. })),
                "expected configuration error for {case}"
            );
        }
    }

    #[test]
    fn rejects_non_array_documents() {
        let error = decode(json!({"key": "a"})).expect_err("object document");
        assert!(error.to_string().contains("JSON array"));
    }
}
