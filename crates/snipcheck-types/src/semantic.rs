//! Language-neutral semantic types.
//!
//! A [`SemanticType`] is how the host describes the type of a variable or the
//! expected result of an expression. Engines render it into their own syntax;
//! the kernel walks its hierarchy to decide which modules must be referenced.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// Module that defines the well-known primitive types.
pub const CORE_MODULE: &str = "core";

/// A named type, the module defining it, its generic arguments, and its bases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticType {
    /// Fully qualified name, e.g. `core.Integer` or `geo.Square`.
    pub name: String,
    pub module: ModuleId,
    #[serde(default)]
    pub args: Vec<SemanticType>,
    /// Direct base types and interfaces.
    #[serde(default)]
    pub bases: Vec<SemanticType>,
}

impl SemanticType {
    pub fn named(name: impl Into<String>, module: impl Into<ModuleId>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            args: Vec::new(),
            bases: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: SemanticType) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_base(mut self, base: SemanticType) -> Self {
        self.bases.push(base);
        self
    }

    pub fn integer() -> Self {
        Self::named("core.Integer", CORE_MODULE)
    }

    pub fn float() -> Self {
        Self::named("core.Float", CORE_MODULE)
    }

    pub fn boolean() -> Self {
        Self::named("core.Boolean", CORE_MODULE)
    }

    pub fn string() -> Self {
        Self::named("core.String", CORE_MODULE)
    }

    pub fn object() -> Self {
        Self::named("core.Object", CORE_MODULE)
    }

    /// The last dotted segment of the name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The namespace part of the name, if it is qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(ns, _)| ns)
    }

    /// This type plus every base type and generic argument, transitively.
    ///
    /// Deduplicated by name, in depth-first discovery order starting with `self`.
    pub fn hierarchy(&self) -> Vec<&SemanticType> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![self];

        while let Some(ty) = stack.pop() {
            if !seen.insert(ty.name.as_str()) {
                continue;
            }
            out.push(ty);
            // Reverse so the first base is visited first.
            for arg in ty.args.iter().rev() {
                stack.push(arg);
            }
            for base in ty.bases.iter().rev() {
                stack.push(base);
            }
        }

        out
    }

    /// Distinct modules defining any type in [`hierarchy`](Self::hierarchy).
    pub fn defining_modules(&self) -> Vec<ModuleId> {
        let mut modules: Vec<ModuleId> = Vec::new();
        for ty in self.hierarchy() {
            if !modules.contains(&ty.module) {
                modules.push(ty.module.clone());
            }
        }
        modules
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}
