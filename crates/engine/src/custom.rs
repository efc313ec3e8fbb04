//! Named hooks for CUSTOM rules.
//!
//! A CUSTOM rule names a hook and optionally a wrapped entry. The resolver
//! resolves the wrapped entry first and passes its value as the hook input.
//! Hosts register their own hooks next to the built-in ones.

use std::{collections::HashMap, fmt, sync::Arc};

use anyhow::{anyhow, bail};
use jsonmap_types::{GlobalAttributes, MappingValue, Scalar};
use serde_json::{Map as JsonMap, Value};

use crate::context::ResolveContext;

/// Input handed to a hook.
#[derive(Debug, Clone, Copy)]
pub struct CustomInvocation<'a> {
    /// Key of the CUSTOM entry being resolved.
    pub key: &'a str,
    /// Value of the wrapped entry, when the rule names one.
    pub input: Option<&'a MappingValue>,
    pub parameters: &'a JsonMap<String, Value>,
    pub context: &'a ResolveContext,
    pub globals: &'a GlobalAttributes,
}

impl CustomInvocation<'_> {
    fn required_input(&self) -> anyhow::Result<&MappingValue> {
        self.input.ok_or_else(|| anyhow!("hook requires a 'variable' to operate on"))
    }
}

pub trait CustomHook: Send + Sync {
    fn apply(&self, invocation: &CustomInvocation<'_>) -> anyhow::Result<MappingValue>;
}

impl<F> CustomHook for F
where
    F: Fn(&CustomInvocation<'_>) -> anyhow::Result<MappingValue> + Send + Sync,
{
    fn apply(&self, invocation: &CustomInvocation<'_>) -> anyhow::Result<MappingValue> {
        self(invocation)
    }
}

/// Hooks by name.
#[derive(Clone, Default)]
pub struct CustomHookRegistry {
    hooks: HashMap<String, Arc<dyn CustomHook>>,
}

impl fmt::Debug for CustomHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("CustomHookRegistry").field("hooks", &names).finish()
    }
}

impl CustomHookRegistry {
    /// A registry without any hooks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding `negate`, `reverse` and `size`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("negate", Arc::new(negate));
        registry.register("reverse", Arc::new(reverse));
        registry.register("size", Arc::new(size));
        registry
    }

    /// Registers `hook` under `name`, replacing any previous hook.
    pub fn register(&mut self, name: impl Into<String>, hook: Arc<dyn CustomHook>) {
        self.hooks.insert(name.into(), hook);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomHook>> {
        self.hooks.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.keys().map(String::as_str).collect()
    }
}

fn negate(invocation: &CustomInvocation<'_>) -> anyhow::Result<MappingValue> {
    match invocation.required_input()? {
        MappingValue::Scalar(scalar) => Ok(MappingValue::Scalar(scalar.negated())),
        MappingValue::Array(array) => Ok(MappingValue::Array(array.negated())),
        MappingValue::Empty => Ok(MappingValue::Empty),
        MappingValue::Text(_) => bail!("cannot negate text"),
    }
}

fn reverse(invocation: &CustomInvocation<'_>) -> anyhow::Result<MappingValue> {
    Ok(match invocation.required_input()? {
        MappingValue::Array(array) => MappingValue::Array(array.reversed()),
        MappingValue::Text(text) => MappingValue::Text(text.chars().rev().collect()),
        other => other.clone(),
    })
}

fn size(invocation: &CustomInvocation<'_>) -> anyhow::Result<MappingValue> {
    let count = invocation.required_input()?.element_count();
    Ok(MappingValue::Scalar(Scalar::U64(count as u64)))
}
