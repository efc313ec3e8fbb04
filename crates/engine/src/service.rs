//! Session entry point: normalize, look up, resolve.

use jsonmap_registry::{EntryRegistry, MappingConfig, MappingHandler};
use jsonmap_types::{MappingEntry, MappingError, MappingKind, MappingValue};
use tracing::{debug, info};

use crate::{
    context::ResolveContext,
    request::{MappingRequest, NormalizedPath},
    resolver::{EntryResolver, ResolveScope},
};

/// One long-lived mapping session: the handler's cache plus the resolver.
#[derive(Debug, Default)]
pub struct MappingService {
    handler: MappingHandler,
    resolver: EntryResolver,
}

impl MappingService {
    pub fn new(handler: MappingHandler, resolver: EntryResolver) -> Self {
        Self { handler, resolver }
    }

    /// Service over `config` with the null fetcher and built-in hooks.
    pub fn from_config(config: MappingConfig) -> Self {
        Self::new(MappingHandler::new(config), EntryResolver::default())
    }

    pub fn handler(&self) -> &MappingHandler {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut MappingHandler {
        &mut self.handler
    }

    pub fn resolver(&self) -> &EntryResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut EntryResolver {
        &mut self.resolver
    }

    /// Resolves one request to a value.
    ///
    /// A request naming a different data-dictionary version than the cached
    /// one resets the handler before loading.
    pub fn resolve(&mut self, request: &MappingRequest) -> Result<MappingValue, MappingError> {
        let path = request.normalize()?;
        if let Some(dd_version) = request.dd_version.as_deref()
            && dd_version != self.handler.dd_version()
        {
            info!(
                from = %self.handler.dd_version(),
                to = %dd_version,
                "data dictionary version changed, resetting mapping cache"
            );
            self.handler.set_dd_version(dd_version);
            self.handler.reset();
        }

        let dd_version = self.handler.dd_version().to_string();
        let (globals, registry) = self.handler.resolve_registry(&request.facility, &path.schema)?;
        let (entry, path) = lookup(registry, path, &request.path)?;
        debug!(
            facility = %request.facility,
            schema = %path.schema,
            key = %path.key,
            signal_type = %path.signal_type,
            index_count = path.indices.len(),
            "resolving request"
        );

        let context = ResolveContext::new(request, &path, &dd_version);
        let scope = ResolveScope {
            context: &context,
            registry,
            globals,
        };
        self.resolver.resolve(entry, &scope)
    }

    /// Keys and kinds mapped for `facility`/`schema`, in declaration order.
    pub fn list(&mut self, facility: &str, schema: &str) -> Result<Vec<(String, MappingKind)>, MappingError> {
        let (_, registry) = self.handler.resolve_registry(facility, schema)?;
        Ok(registry
            .iter()
            .map(|entry| (entry.key().to_string(), entry.mapping_kind()))
            .collect())
    }
}

/// Exact key first, then the path with one `data`/`time` suffix stripped.
fn lookup<'a>(
    registry: &'a EntryRegistry,
    path: NormalizedPath,
    request_path: &str,
) -> Result<(&'a MappingEntry, NormalizedPath), MappingError> {
    if let Some(entry) = registry.get(&path.key) {
        return Ok((entry, path));
    }
    if let Some(fallback) = path.fallback()
        && let Some(entry) = registry.get(&fallback.key)
    {
        debug!(key = %fallback.key, signal_type = %fallback.signal_type, "matched after stripping signal suffix");
        return Ok((entry, fallback));
    }
    Err(MappingError::lookup(format!(
        "no mapping for '{request_path}' (key '{}' in schema '{}')",
        path.key, path.schema
    )))
}
