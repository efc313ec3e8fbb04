use jsonmap_types::{CustomRule, MappingError, MappingValue};
use tracing::debug;

use crate::{custom::CustomInvocation, resolver::Resolution};

pub(crate) fn resolve(rule: &CustomRule, key: &str, resolution: &mut Resolution<'_, '_>) -> Result<MappingValue, MappingError> {
    let hook = resolution
        .resolver
        .hooks()
        .get(&rule.name)
        .cloned()
        .ok_or_else(|| MappingError::transform(key, format!("unknown custom hook '{}'", rule.name)))?;

    let input = match rule.variable.as_deref() {
        Some(reference) => Some(resolution.reference(key, reference)?),
        None => None,
    };

    debug!(key = %key, hook = %rule.name, has_input = input.is_some(), "invoking custom hook");
    let invocation = CustomInvocation {
        key,
        input: input.as_ref(),
        parameters: &rule.parameters,
        context: resolution.context(),
        globals: resolution.globals(),
    };
    hook.apply(&invocation)
        .map_err(|error| MappingError::transform(key, format!("custom hook '{}' failed: {error:#}", rule.name)))
}
