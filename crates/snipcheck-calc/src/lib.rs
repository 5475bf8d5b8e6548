//! calc: a small typed expression language for snipcheck.
//!
//! Expressions are things like `if len(name) > 3 then upper(name) else name`.
//! There are five primitive types (`Int`, `Float`, `Bool`, `Str`, `Any`) plus
//! whatever named types the referenced modules export. Nothing is ever
//! evaluated; the language exists to be checked.
//!
//! [`CalcEngine`] implements the kernel's `LanguageEngine`:
//!
//! - **Lexer** ([`lexer`]): logos tokens
//! - **Parser** ([`parser`]): chumsky combinators producing a wrapper [`ast::Lambda`]
//! - **Checker** ([`checker`]): coded diagnostics against attached references
//! - **Catalog** ([`catalog`]): the modules the engine can describe

pub mod ast;
pub mod catalog;
pub mod checker;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod syntax;

pub use catalog::{ModuleCatalog, core_module};
pub use checker::CalcType;
pub use engine::{CalcEngine, render_type};
pub use syntax::{CalcTree, NodeKind};
