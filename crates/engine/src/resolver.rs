//! Entry resolution.
//!
//! [`EntryResolver`] executes one entry against a registry. Rules that wrap
//! other entries resolve them by key through the same registry, recursively;
//! the chain of keys being resolved is tracked so cycles and runaway nesting
//! fail instead of recursing forever.

use std::{fmt, sync::Arc};

use jsonmap_registry::EntryRegistry;
use jsonmap_types::{EntryKind, GlobalAttributes, MappingEntry, MappingError, MappingValue};
use tracing::trace;

use crate::{
    context::ResolveContext,
    custom::CustomHookRegistry,
    entries,
    fetch::{NullFetcher, SignalFetcher},
};

/// Deepest reference chain a single resolution may build.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What one resolution reads: the request context plus the schema's
/// registry and globals.
#[derive(Debug, Clone, Copy)]
pub struct ResolveScope<'a> {
    pub context: &'a ResolveContext,
    pub registry: &'a EntryRegistry,
    pub globals: &'a GlobalAttributes,
}

pub struct EntryResolver {
    fetcher: Arc<dyn SignalFetcher>,
    hooks: CustomHookRegistry,
    max_depth: usize,
}

impl fmt::Debug for EntryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryResolver")
            .field("hooks", &self.hooks)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl Default for EntryResolver {
    fn default() -> Self {
        Self::new(Arc::new(NullFetcher), CustomHookRegistry::with_builtins())
    }
}

impl EntryResolver {
    pub fn new(fetcher: Arc<dyn SignalFetcher>, hooks: CustomHookRegistry) -> Self {
        Self {
            fetcher,
            hooks,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn fetcher(&self) -> &dyn SignalFetcher {
        self.fetcher.as_ref()
    }

    pub fn hooks(&self) -> &CustomHookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut CustomHookRegistry {
        &mut self.hooks
    }

    pub fn resolve(&self, entry: &MappingEntry, scope: &ResolveScope<'_>) -> Result<MappingValue, MappingError> {
        Resolution::new(self, scope).entry(entry)
    }
}

/// State of one top-level resolution: the keys currently being resolved,
/// outermost first.
pub(crate) struct Resolution<'r, 's> {
    pub(crate) resolver: &'r EntryResolver,
    pub(crate) scope: &'r ResolveScope<'s>,
    chain: Vec<String>,
}

impl<'r, 's> Resolution<'r, 's> {
    fn new(resolver: &'r EntryResolver, scope: &'r ResolveScope<'s>) -> Self {
        Self {
            resolver,
            scope,
            chain: Vec::new(),
        }
    }

    pub(crate) fn context(&self) -> &'s ResolveContext {
        self.scope.context
    }

    pub(crate) fn globals(&self) -> &'s GlobalAttributes {
        self.scope.globals
    }

    /// Resolves the entry `owner` wraps under `reference`.
    pub(crate) fn reference(&mut self, owner: &str, reference: &str) -> Result<MappingValue, MappingError> {
        let entry = self
            .scope
            .registry
            .get(reference)
            .ok_or_else(|| MappingError::transform(owner, format!("referenced entry '{reference}' does not exist")))?;
        self.entry(entry)
    }

    pub(crate) fn entry(&mut self, entry: &MappingEntry) -> Result<MappingValue, MappingError> {
        let key = entry.key();
        if self.chain.iter().any(|visited| visited == key) {
            return Err(MappingError::transform(
                key,
                format!("reference cycle: {} -> {key}", self.chain.join(" -> ")),
            ));
        }
        if self.chain.len() >= self.resolver.max_depth {
            return Err(MappingError::transform(
                key,
                format!("reference chain exceeds {} entries", self.resolver.max_depth),
            ));
        }

        trace!(key = %key, kind = %entry.mapping_kind(), depth = self.chain.len(), "resolving entry");
        self.chain.push(key.to_string());
        let result = match entry.kind() {
            EntryKind::Value(rule) => entries::value::resolve(rule, key, self.globals()),
            EntryKind::Plugin(rule) => entries::plugin::resolve(rule, key, self),
            EntryKind::Dim(rule) => entries::dim::resolve(rule, key, self),
            EntryKind::Slice(rule) => entries::slice::resolve(rule, key, self),
            EntryKind::Expr(rule) => entries::expr::resolve(rule, key, self),
            EntryKind::Custom(rule) => entries::custom::resolve(rule, key, self),
            EntryKind::Offset(rule) => entries::offset::resolve(rule, key, self),
        };
        self.chain.pop();
        result
    }
}
