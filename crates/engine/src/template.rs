//! `{{ ... }}` rendering for PLUGIN arguments.
//!
//! Templates name a value in the resolution scope by dot path
//! (`{{ shot }}`, `{{ indices[0] }}`, `{{ coils.names[2] }}`). A string that
//! is exactly one template takes the value's JSON type; templates embedded in
//! longer strings are spliced in as text and must not be null.

use jsonmap_types::GlobalAttributes;
use serde_json::{Map as JsonMap, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Renders every template in `args`, recursing into arrays and objects.
///
/// Fails with the unresolved name when a template refers to nothing.
pub fn render_args(args: &JsonMap<String, Value>, scope: &GlobalAttributes) -> Result<JsonMap<String, Value>, String> {
    args.iter()
        .map(|(name, value)| render_value(value, scope).map(|rendered| (name.clone(), rendered)))
        .collect()
}

pub fn render_value(value: &Value, scope: &GlobalAttributes) -> Result<Value, String> {
    match value {
        Value::String(text) => render_string(text, scope),
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => render_args(map, scope).map(Value::Object),
        _ => Ok(value.clone()),
    }
}

fn render_string(input: &str, scope: &GlobalAttributes) -> Result<Value, String> {
    if let Some(name) = whole_template(input) {
        return lookup(name, scope).cloned();
    }

    let mut output = String::new();
    let mut remaining = input;
    while let Some(start) = remaining.find(OPEN) {
        let (before, after) = remaining.split_at(start);
        output.push_str(before);
        let Some(end) = after.find(CLOSE) else {
            // Unterminated template: keep the rest verbatim.
            output.push_str(after);
            return Ok(Value::String(output));
        };
        let name = after[OPEN.len()..end].trim();
        match lookup(name, scope)? {
            Value::String(text) => output.push_str(text),
            Value::Null => return Err(format!("template '{name}' has no value to splice into '{input}'")),
            other => output.push_str(&other.to_string()),
        }
        remaining = &after[end + CLOSE.len()..];
    }
    output.push_str(remaining);
    Ok(Value::String(output))
}

fn whole_template(input: &str) -> Option<&str> {
    let inner = input.trim().strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    if inner.contains(OPEN) || inner.contains(CLOSE) {
        return None;
    }
    Some(inner.trim())
}

fn lookup<'a>(name: &str, scope: &'a GlobalAttributes) -> Result<&'a Value, String> {
    if name.is_empty() {
        return Err("empty template".to_string());
    }
    scope.get(name).ok_or_else(|| format!("template refers to unknown name '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> GlobalAttributes {
        GlobalAttributes::new(
            json!({
                "shot": 99000,
                "indices": [3, 1],
                "signal_prefix": "AMC",
                "run": null,
                "coils": {"names": ["P1", "P2", "P3", "P4"]}
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        )
    }

    #[test]
    fn whole_templates_keep_json_type() {
        assert_eq!(render_value(&json!("{{ shot }}"), &scope()), Ok(json!(99000)));
        assert_eq!(render_value(&json!("{{indices}}"), &scope()), Ok(json!([3, 1])));
    }

    #[test]
    fn embedded_templates_are_spliced_as_text() {
        let rendered = render_value(&json!("{{ signal_prefix }}_PLASMA/{{ coils.names[3] }}:{{ indices[0] }}"), &scope());
        assert_eq!(rendered, Ok(json!("AMC_PLASMA/P4:3")));
    }

    #[test]
    fn nested_arguments_are_rendered() {
        let args = json!({"signal": ["{{ signal_prefix }}", 7], "options": {"pulse": "{{ shot }}"}});
        let rendered = render_args(args.as_object().expect("object"), &scope()).expect("render");
        assert_eq!(Value::Object(rendered), json!({"signal": ["AMC", 7], "options": {"pulse": 99000}}));
    }

    #[test]
    fn unknown_names_fail() {
        let error = render_value(&json!("XMC/{{ missing }}"), &scope()).expect_err("unknown name");
        assert!(error.contains("missing"));
        assert!(render_value(&json!("{{ coils.names[9] }}"), &scope()).is_err());
    }

    #[test]
    fn unset_values_cannot_be_embedded() {
        let error = render_value(&json!("XMC/{{ run }}"), &scope()).expect_err("null splice");
        assert!(error.contains("run"));
        assert_eq!(render_value(&json!("{{ run }}"), &scope()), Ok(Value::Null));
    }

    #[test]
    fn unterminated_templates_are_left_alone() {
        assert_eq!(render_value(&json!("AMC {{ shot"), &scope()), Ok(json!("AMC {{ shot")));
    }
}
