//! Validator configuration.

use serde::{Deserialize, Serialize};
use snipcheck_types::{CORE_MODULE, ModuleId};

/// Configuration for validator construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Modules every compilation references.
    pub default_modules: Vec<ModuleId>,
    /// Extra modules the embedding application always wants referenced.
    pub additional_modules: Vec<ModuleId>,
    /// Attach snippet spans to validation errors.
    pub attach_spans: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_modules: vec![ModuleId::new(CORE_MODULE)],
            additional_modules: Vec::new(),
            attach_spans: false,
        }
    }
}

impl ValidatorConfig {
    /// No seeded modules at all; everything is discovered per call.
    pub fn bare() -> Self {
        Self {
            default_modules: Vec::new(),
            additional_modules: Vec::new(),
            attach_spans: false,
        }
    }

    pub fn with_module(mut self, module: impl Into<ModuleId>) -> Self {
        self.additional_modules.push(module.into());
        self
    }

    pub fn with_spans(mut self, attach: bool) -> Self {
        self.attach_spans = attach;
        self
    }

    /// Default modules followed by additional ones, without repeats.
    pub fn seed_modules(&self) -> Vec<ModuleId> {
        let mut seed: Vec<ModuleId> = Vec::new();
        for module in self.default_modules.iter().chain(&self.additional_modules) {
            if !seed.contains(module) {
                seed.push(module.clone());
            }
        }
        seed
    }
}
