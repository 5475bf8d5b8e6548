//! snipcheck REPL: validate calc snippets interactively.
//!
//! Each input line is validated against the session's host context:
//! declared variables, the expected result type, namespace imports and
//! local modules. Meta-commands (`/help`) change that context.

pub mod config;
pub mod paths;
pub mod render;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use snipcheck_calc::{CalcEngine, render_type};
use snipcheck_kernel::{ActivityNode, ExpressionValidator, ReferenceCache, VariableScope};
use snipcheck_types::{ModuleId, SemanticType, ValidationError};

pub use config::{ConfigError, ReplConfig};

/// A semantic type from the name a user types.
///
/// The calc primitive names map onto `core`; anything else is taken as a
/// qualified name whose first segment is the defining module.
pub fn parse_type(name: &str) -> SemanticType {
    match name.trim() {
        "Int" => SemanticType::integer(),
        "Float" => SemanticType::float(),
        "Bool" => SemanticType::boolean(),
        "Str" => SemanticType::string(),
        "Any" => SemanticType::object(),
        other => {
            let module = other.split('.').next().unwrap_or(other);
            SemanticType::named(other, module)
        }
    }
}

/// Parse `name: Type`.
pub fn parse_binding(text: &str) -> Result<(String, SemanticType)> {
    let Some((name, ty)) = text.split_once(':') else {
        bail!("expected `name: Type`, got `{text}`");
    };
    let name = name.trim();
    let ty = ty.trim();
    if name.is_empty() || ty.is_empty() {
        bail!("expected `name: Type`, got `{text}`");
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        bail!("`{name}` is not an identifier");
    }
    Ok((name.to_string(), parse_type(ty)))
}

/// One-shot validation request, as given on the command line.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub snippet: String,
    pub expected: SemanticType,
    pub variables: Vec<(String, SemanticType)>,
    pub imports: Vec<String>,
    pub modules: Vec<ModuleId>,
}

impl CheckRequest {
    pub fn new(snippet: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            expected: SemanticType::object(),
            variables: Vec::new(),
            imports: Vec::new(),
            modules: Vec::new(),
        }
    }
}

/// Validate a single request under `config`.
pub fn check(config: &ReplConfig, request: &CheckRequest) -> Result<Vec<ValidationError>> {
    let validator = validator(config);
    let node = host_node("check", &request.imports, &request.modules);
    let env = request
        .variables
        .iter()
        .fold(VariableScope::new(), |env, (name, ty)| env.with(name.as_str(), ty.clone()));

    validator
        .validate(&node, &env, &request.expected, &request.snippet)
        .context("validation failed")
}

fn validator(config: &ReplConfig) -> ExpressionValidator<CalcEngine> {
    // The catalog is per config, so the cache is too.
    ExpressionValidator::with_cache(
        CalcEngine::with_catalog(config.catalog()),
        config.validator.clone(),
        Arc::new(ReferenceCache::new()),
    )
}

fn host_node(name: &str, imports: &[String], modules: &[ModuleId]) -> ActivityNode {
    let node = imports
        .iter()
        .fold(ActivityNode::root(name), |node, ns| node.with_import(ns.as_str()));
    modules
        .iter()
        .fold(node, |node, module| node.with_module(module.clone()))
}

/// REPL state.
pub struct Repl {
    validator: ExpressionValidator<CalcEngine>,
    scope: VariableScope,
    expected: SemanticType,
    imports: Vec<String>,
    modules: Vec<ModuleId>,
    color: bool,
    json: bool,
    show_wrapper: bool,
    done: bool,
}

impl Repl {
    pub fn new(config: &ReplConfig) -> Self {
        Self {
            validator: validator(config),
            scope: VariableScope::new(),
            expected: SemanticType::object(),
            imports: Vec::new(),
            modules: Vec::new(),
            color: config.color,
            json: false,
            show_wrapper: false,
            done: false,
        }
    }

    /// True once `/quit` has been entered.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();

        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed);
        }
        if trimmed.is_empty() {
            return Ok(None);
        }

        self.validate(trimmed).map(Some)
    }

    fn validate(&self, snippet: &str) -> Result<String> {
        let node = host_node("repl", &self.imports, &self.modules);
        let mut output = String::new();

        if self.show_wrapper {
            let compiled = self
                .validator
                .compile(&node, &self.scope, &self.expected, snippet)
                .context("compilation failed")?;
            if let Some(tree) = compiled.unit.tree() {
                output.push_str(&format!("wrapper: {}\n", tree.source()));
            }
        }

        let errors = self
            .validator
            .validate(&node, &self.scope, &self.expected, snippet)
            .context("validation failed")?;

        if self.json {
            output.push_str(&render::json(&errors)?);
        } else {
            output.push_str(&render::report(&errors, snippet, self.color));
        }
        Ok(output)
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> Result<Option<String>> {
        let (command, rest) = match cmd.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (cmd, ""),
        };

        match command {
            "/quit" | "/q" | "/exit" => {
                self.done = true;
                Ok(None)
            }
            "/help" | "/h" | "/?" => Ok(Some(HELP_TEXT.to_string())),
            "/let" => {
                let (name, ty) = parse_binding(rest)?;
                let shown = format!("{name}: {}", ty.name);
                self.scope.declare(name, ty);
                Ok(Some(shown))
            }
            "/expect" => {
                if rest.is_empty() {
                    return Ok(Some(format!("expected type: {}", self.expected.name)));
                }
                self.expected = parse_type(rest);
                Ok(Some(format!(
                    "expected type: {} (`{}`)",
                    self.expected.name,
                    render_type(&self.expected)
                )))
            }
            "/import" => {
                if rest.is_empty() {
                    bail!("usage: /import <namespace>");
                }
                if !self.imports.iter().any(|ns| ns == rest) {
                    self.imports.push(rest.to_string());
                }
                Ok(Some(format!("imports: {}", self.imports.join(", "))))
            }
            "/module" => {
                if rest.is_empty() {
                    bail!("usage: /module <id>");
                }
                let id = ModuleId::new(rest);
                if !self.modules.contains(&id) {
                    self.modules.push(id);
                }
                Ok(Some(format!("local modules: {}", join(&self.modules))))
            }
            "/push" => {
                self.scope.push_frame();
                Ok(Some(format!("scope depth: {}", self.scope.depth())))
            }
            "/pop" => {
                self.scope.pop_frame();
                Ok(Some(format!("scope depth: {}", self.scope.depth())))
            }
            "/vars" | "/scope" => {
                let names = self.scope.visible_names();
                if names.is_empty() {
                    return Ok(Some("(no variables declared)".to_string()));
                }
                let mut output = String::from("Variables:\n");
                for name in names {
                    if let Some(ty) = self.scope.lookup(name) {
                        output.push_str(&format!("  {name}: {}\n", ty.name));
                    }
                }
                Ok(Some(output.trim_end().to_string()))
            }
            "/modules" => {
                let catalog: Vec<ModuleId> =
                    self.validator.engine().catalog().ids().cloned().collect();
                let loaded: Vec<ModuleId> = self
                    .validator
                    .cache()
                    .handles()
                    .iter()
                    .map(|h| h.module().clone())
                    .collect();
                Ok(Some(format!(
                    "catalog: {}\nloaded: {}",
                    join(&catalog),
                    join(&loaded)
                )))
            }
            "/json" => {
                self.json = !self.json;
                Ok(Some(format!("JSON output: {}", on_off(self.json))))
            }
            "/wrapper" => {
                self.show_wrapper = !self.show_wrapper;
                Ok(Some(format!("wrapper display: {}", on_off(self.show_wrapper))))
            }
            "/reset" => {
                self.scope = VariableScope::new();
                self.expected = SemanticType::object();
                self.imports.clear();
                self.modules.clear();
                Ok(Some("context cleared".to_string()))
            }
            _ => Ok(Some(format!(
                "Unknown command: {command}\nType /help for available commands."
            ))),
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

fn join(ids: &[ModuleId]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter().map(ModuleId::as_str).collect::<Vec<_>>().join(", ")
}

const HELP_TEXT: &str = r#"snipcheck: validate calc expressions in context

Commands:
  /help, /h, /?       Show this help
  /quit, /q, /exit    Exit the REPL
  /let name: Type     Declare a variable in the current scope
  /push, /pop         Enter or leave a nested scope
  /vars, /scope       Show visible variables
  /expect Type        Set the expected result type (default Any)
  /import ns          Import a namespace
  /module id          Add a local module reference
  /modules            Show catalog and loaded modules
  /json               Toggle JSON output
  /wrapper            Toggle display of the generated wrapper
  /reset              Clear variables, imports and modules

Types:
  Int Float Bool Str Any, or a qualified name such as geo.Shape

Examples:
  /let x: Int
  /expect Int
  x * 2 + 1
  if x > 0 then x else -x
  len(upper("abc")) + x
"#;

/// Run the REPL.
pub fn run(config: &ReplConfig) -> Result<()> {
    println!("snipcheck v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.\n");

    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    let history_path = config.history.then(paths::history_file);
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    let mut repl = Repl::new(config);

    while !repl.is_done() {
        match rl.readline("snip> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match repl.process_line(&line) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e:#}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }

    Ok(())
}
