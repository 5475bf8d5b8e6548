//! snipcheck entry point.
//!
//! ```bash
//! snipcheck                                  # interactive
//! snipcheck check 'x + 1' --var x:Int --type Int
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use snipcheck_repl::{CheckRequest, ReplConfig, parse_binding, parse_type, render};
use snipcheck_types::ModuleId;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "snipcheck", version)]
#[command(about = "Compile-check calc expression snippets against a host context")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/snipcheck/config.toml)
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one snippet and exit non-zero on errors
    Check(CheckArgs),
    /// Start the interactive validator (the default)
    Repl,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// The expression to validate
    snippet: String,

    /// Expected result type
    #[arg(long = "type", short = 't', default_value = "Any")]
    expected: String,

    /// Variable declaration, repeatable
    #[arg(long = "var", value_name = "NAME:TYPE")]
    vars: Vec<String>,

    /// Namespace import, repeatable
    #[arg(long = "import", value_name = "NAMESPACE")]
    imports: Vec<String>,

    /// Local module reference, repeatable
    #[arg(long = "module", value_name = "ID")]
    modules: Vec<String>,

    /// Print errors as JSON
    #[arg(long = "json")]
    json: bool,
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays clean for reports (respects RUST_LOG)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ReplConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => {
            snipcheck_repl::run(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => check(&config, args),
    }
}

fn check(config: &ReplConfig, args: CheckArgs) -> Result<ExitCode> {
    let variables = args
        .vars
        .iter()
        .map(|v| parse_binding(v))
        .collect::<Result<Vec<_>>>()
        .context("Invalid --var")?;

    let request = CheckRequest {
        snippet: args.snippet,
        expected: parse_type(&args.expected),
        variables,
        imports: args.imports,
        modules: args.modules.into_iter().map(ModuleId::new).collect(),
    };

    let errors = snipcheck_repl::check(config, &request)?;
    tracing::debug!(errors = errors.len(), "check finished");

    if args.json {
        println!("{}", render::json(&errors)?);
    } else {
        let color = config.color && std::io::stdout().is_terminal();
        println!("{}", render::report(&errors, &request.snippet, color));
    }

    if errors.iter().any(|e| !e.is_warning) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
