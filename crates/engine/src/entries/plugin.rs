use jsonmap_types::{MappingError, MappingValue, PluginRule};
use tracing::debug;

use crate::{fetch::FetchRequest, resolver::Resolution, template::render_args};

pub(crate) fn resolve(rule: &PluginRule, key: &str, resolution: &mut Resolution<'_, '_>) -> Result<MappingValue, MappingError> {
    let context = resolution.context();
    let scope = context.template_scope(resolution.globals());
    let args = render_args(&rule.args, &scope).map_err(|message| MappingError::transform(key, message))?;

    let request = FetchRequest {
        plugin: rule.plugin.clone(),
        function: rule.function.clone(),
        args,
        facility: context.facility.clone(),
        key: key.to_string(),
        indices: context.indices.clone(),
        signal_type: context.signal_type,
        shot: context.shot,
        run: context.run,
    };
    debug!(
        key = %key,
        plugin = %request.plugin,
        function = request.function.as_deref().unwrap_or_default(),
        argument_count = request.args.len(),
        "fetching signal"
    );
    resolution
        .resolver
        .fetcher()
        .fetch(&request)
        .map_err(|error| MappingError::transform(key, format!("plugin '{}' failed: {error:#}", rule.plugin)))
}
