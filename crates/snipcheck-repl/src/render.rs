//! Turning validation errors into terminal text or JSON.

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use owo_colors::OwoColorize;
use snipcheck_types::{Span, ValidationError};

/// Human-readable report for one snippet.
///
/// Errors carrying a span are drawn against the snippet; the rest are
/// printed as plain `error:` / `warning:` lines. A summary line closes it.
pub fn report(errors: &[ValidationError], snippet: &str, color: bool) -> String {
    let mut out = String::new();

    for error in errors {
        let rendered = error
            .span
            .and_then(|span| with_source(error, span, snippet, color))
            .unwrap_or_else(|| plain(error, color));
        out.push_str(rendered.trim_end());
        out.push('\n');
    }

    out.push_str(&summary(errors, color));
    out
}

/// Errors as a pretty-printed JSON array.
pub fn json(errors: &[ValidationError]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(errors)
}

/// `ok`, or counts of errors and warnings.
pub fn summary(errors: &[ValidationError], color: bool) -> String {
    let warnings = errors.iter().filter(|e| e.is_warning).count();
    let failures = errors.len() - warnings;

    if errors.is_empty() {
        return if color {
            "ok".green().to_string()
        } else {
            "ok".to_string()
        };
    }

    let text = format!(
        "{failures} {}, {warnings} {}",
        plural(failures, "error"),
        plural(warnings, "warning")
    );
    match (color, failures) {
        (false, _) => text,
        (true, 0) => text.yellow().to_string(),
        (true, _) => text.red().to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn plain(error: &ValidationError, color: bool) -> String {
    let label = if error.is_warning { "warning" } else { "error" };
    match (color, error.is_warning) {
        (false, _) => format!("{label}: {}", error.message),
        (true, true) => format!("{}: {}", label.yellow().bold(), error.message),
        (true, false) => format!("{}: {}", label.red().bold(), error.message),
    }
}

fn with_source(error: &ValidationError, span: Span, snippet: &str, color: bool) -> Option<String> {
    if span.end > snippet.len() {
        return None;
    }
    let kind = if error.is_warning {
        ReportKind::Warning
    } else {
        ReportKind::Error
    };
    let range = span.range();

    let mut buf = Vec::new();
    Report::build(kind, range.clone())
        .with_config(
            Config::default()
                .with_color(color)
                .with_index_type(IndexType::Byte),
        )
        .with_message(&error.message)
        .with_label(Label::new(range).with_message("here"))
        .finish()
        .write(Source::from(snippet), &mut buf)
        .ok()?;

    String::from_utf8(buf).ok()
}
