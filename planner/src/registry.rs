//! Named-module registry (design note §9 "Module registries").
//!
//! Every pluggable stage — opportunity calculators, pattern generators,
//! sequence generators, filters — is keyed by name and declares `enabled`
//! plus a parameter bag. Dispatch is a tagged-variant `match` against a
//! fixed list of known names rather than runtime monkey-patching; unknown
//! names in configuration fail loudly at load time via
//! [`ModuleConfig::validate_known`], not silently the first time the
//! pipeline runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One module's configuration: whether it runs, and its parameter bag.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ModuleSettings {
    pub enabled: bool,
    #[serde(default)]
    pub params: Value,
}

impl ModuleSettings {
    pub fn enabled(params: Value) -> Self {
        Self {
            enabled: true,
            params,
        }
    }

    /// Reads a numeric parameter by key, falling back to `default` if the
    /// key is absent or not a number.
    pub fn param_f64(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    pub fn param_u64(&self, key: &str, default: u64) -> u64 {
        self.params
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(default)
    }

    pub fn param_usize(&self, key: &str, default: usize) -> usize {
        self.param_u64(key, default as u64) as usize
    }
}

/// `Map[name -> {enabled, params}]`, one per pipeline stage.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ModuleConfig(pub BTreeMap<String, ModuleSettings>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown planner module name in configuration: {0}")]
pub struct UnknownModule(pub String);

impl ModuleConfig {
    /// Fails loudly if any configured name is not in `known` — the
    /// load-time check the design notes require in place of silently
    /// ignoring a typo'd module the first time the pipeline tries to use it.
    pub fn validate_known(&self, known: &[&str]) -> Result<(), UnknownModule> {
        for name in self.0.keys() {
            if !known.contains(&name.as_str()) {
                return Err(UnknownModule(name.clone()));
            }
        }
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.0.get(name).map(|s| s.enabled).unwrap_or(false)
    }

    pub fn settings(&self, name: &str) -> ModuleSettings {
        self.0.get(name).cloned().unwrap_or_default()
    }

    pub fn enabled_names<'a>(&'a self, known: &'a [&'static str]) -> impl Iterator<Item = &'static str> + 'a {
        known.iter().copied().filter(|name| self.is_enabled(name))
    }
}
