//! Validation scenario file parser and runner.
//!
//! Parses the `tests/scenarios/*.test` format and runs each case through an
//! [`ExpressionValidator`] backed by the calc engine.
//!
//! ```text
//! # test: undeclared_identifier
//! # type: core.Integer
//! # var: x = core.Integer
//! # import: geo
//! # module: geo
//! ---
//! x + y
//! ---
//! error: E100: undeclared identifier `y`
//! ===
//! ```
//!
//! The expected section lists validation errors one per line, rendered as
//! `error: ...` or `warning: ...`. An empty section means the snippet must
//! validate cleanly. A trailing `*` matches any suffix. `# skip: reason`
//! skips the case.

use std::sync::Arc;

use snipcheck_calc::{CalcEngine, ModuleCatalog};
use snipcheck_kernel::{
    ActivityNode, ExpressionValidator, ReferenceCache, ValidatorConfig, VariableScope,
};
use snipcheck_types::{ModuleId, SemanticType};

use crate::report::{Outcome, ScenarioReport, line_matches};

/// A single validation scenario.
#[derive(Debug, Clone)]
pub struct ScenarioCase {
    /// Test name from the `# test: name` line.
    pub name: String,
    /// Line number where the test starts (1-indexed).
    pub line_number: usize,
    /// Expected result type; defaults to `core.Object`.
    pub expected_type: SemanticType,
    pub variables: Vec<(String, SemanticType)>,
    pub imports: Vec<String>,
    pub modules: Vec<ModuleId>,
    pub skip: Option<String>,
    /// The snippet text.
    pub input: String,
    /// Expected validation errors, one rendered error per line.
    pub expected: Vec<String>,
    /// Directives that could not be understood.
    pub problems: Vec<String>,
}

/// A semantic type from its qualified name; the module is the first segment.
pub fn semantic_type(name: &str) -> SemanticType {
    let module = name.split('.').next().unwrap_or(name);
    SemanticType::named(name, module)
}

/// Parse the *.test file format into scenario cases.
pub fn parse_scenarios(content: &str) -> Vec<ScenarioCase> {
    let mut cases = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let Some(name) = lines[i].trim().strip_prefix("# test:") else {
            i += 1;
            continue;
        };

        let mut case = ScenarioCase {
            name: name.trim().to_string(),
            line_number: i + 1,
            expected_type: SemanticType::object(),
            variables: Vec::new(),
            imports: Vec::new(),
            modules: Vec::new(),
            skip: None,
            input: String::new(),
            expected: Vec::new(),
            problems: Vec::new(),
        };
        i += 1;

        // Directives until the first ---
        while i < lines.len() && lines[i].trim() != "---" {
            case.directive(lines[i].trim());
            i += 1;
        }
        i += 1;

        // Snippet until the next ---
        let mut input_lines = Vec::new();
        while i < lines.len() && lines[i].trim() != "---" {
            input_lines.push(lines[i]);
            i += 1;
        }
        i += 1;

        // Expected errors until ===
        while i < lines.len() && lines[i].trim() != "===" {
            let line = lines[i].trim();
            if !line.is_empty() {
                case.expected.push(line.to_string());
            }
            i += 1;
        }
        i += 1;

        case.input = input_lines.join("\n");
        cases.push(case);
    }

    cases
}

impl ScenarioCase {
    fn directive(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        let Some((key, value)) = line
            .strip_prefix('#')
            .and_then(|rest| rest.split_once(':'))
        else {
            self.problems.push(format!("not a directive: {line}"));
            return;
        };
        let value = value.trim();

        match key.trim() {
            "type" => self.expected_type = semantic_type(value),
            "import" => self.imports.push(value.to_string()),
            "module" => self.modules.push(ModuleId::new(value)),
            "skip" => self.skip = Some(value.to_string()),
            "var" => match value.split_once('=') {
                Some((name, ty)) => self
                    .variables
                    .push((name.trim().to_string(), semantic_type(ty.trim()))),
                None => self.problems.push(format!("var needs `name = type`: {value}")),
            },
            other => self.problems.push(format!("unknown directive `{other}`")),
        }
    }

    /// Validate the snippet and compare against the expected errors.
    pub fn run(&self, validator: &ExpressionValidator<CalcEngine>) -> Outcome {
        if let Some(reason) = &self.skip {
            return Outcome::Skipped(reason.clone());
        }
        if !self.problems.is_empty() {
            return Outcome::Invalid(self.problems.join("; "));
        }

        let node = self
            .imports
            .iter()
            .fold(ActivityNode::root(self.name.as_str()), |node, ns| node.with_import(ns.as_str()));
        let node = self
            .modules
            .iter()
            .fold(node, |node, module| node.with_module(module.clone()));
        let env = self
            .variables
            .iter()
            .fold(VariableScope::new(), |env, (name, ty)| env.with(name.as_str(), ty.clone()));

        let actual = match validator.validate(&node, &env, &self.expected_type, &self.input) {
            Ok(errors) => errors,
            Err(e) => return Outcome::Invalid(e.to_string()),
        };

        let matches = actual.len() == self.expected.len()
            && actual
                .iter()
                .zip(&self.expected)
                .all(|(actual, expected)| line_matches(&actual.to_string(), expected));

        if matches {
            Outcome::Matched
        } else {
            Outcome::Mismatch { actual }
        }
    }
}

/// A validator over the given catalog with its own reference cache.
pub fn scenario_validator(catalog: ModuleCatalog) -> ExpressionValidator<CalcEngine> {
    ExpressionValidator::with_cache(
        CalcEngine::with_catalog(catalog),
        ValidatorConfig::default(),
        Arc::new(ReferenceCache::new()),
    )
}

/// Run every case, in file order.
pub fn run_scenarios<'a>(
    cases: &'a [ScenarioCase],
    validator: &ExpressionValidator<CalcEngine>,
) -> ScenarioReport<'a> {
    let mut report = ScenarioReport::default();
    for case in cases {
        report.push(case, case.run(validator));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# test: clean
# type: core.Integer
# var: x = core.Integer
---
x + 1
---
===

# test: two_errors
# import: geo
---
a + b
---
error: E100: undeclared identifier `a`
error: E100: *
===
"#;

    #[test]
    fn parses_directives_and_sections() {
        let cases = parse_scenarios(SAMPLE);
        assert_eq!(cases.len(), 2);

        let clean = &cases[0];
        assert_eq!(clean.name, "clean");
        assert_eq!(clean.line_number, 2);
        assert_eq!(clean.expected_type, SemanticType::integer());
        assert_eq!(clean.variables, vec![("x".to_string(), SemanticType::integer())]);
        assert_eq!(clean.input, "x + 1");
        assert!(clean.expected.is_empty());

        let two = &cases[1];
        assert_eq!(two.imports, vec!["geo".to_string()]);
        assert_eq!(two.expected_type, SemanticType::object());
        assert_eq!(two.expected.len(), 2);
    }

    #[test]
    fn runs_cases() {
        let cases = parse_scenarios(SAMPLE);
        let validator = scenario_validator(ModuleCatalog::new());

        assert!(cases[0].run(&validator).is_matched());
        // The unprovided `geo` import adds a warning the case does not list.
        let Outcome::Mismatch { actual } = cases[1].run(&validator) else {
            panic!("expected a mismatch");
        };
        assert_eq!(actual.len(), 3);
        assert_eq!(actual.iter().filter(|e| e.is_warning).count(), 1, "{actual:?}");
    }

    #[test]
    fn bad_directives_are_errors() {
        let cases = parse_scenarios("# test: broken\n# var: x\n# colour: red\n---\n1\n---\n===\n");
        assert_eq!(cases[0].problems.len(), 2);
        let validator = scenario_validator(ModuleCatalog::new());
        assert!(matches!(cases[0].run(&validator), Outcome::Invalid(_)));
    }

    #[test]
    fn report_lists_only_failing_cases() {
        let cases = parse_scenarios(SAMPLE);
        let validator = scenario_validator(ModuleCatalog::new());
        let report = run_scenarios(&cases, &validator);

        assert_eq!(report.len(), 2);
        assert!(!report.all_matched());
        let text = report.to_string();
        assert!(text.starts_with("two_errors (line 10): a + b\n"), "{text}");
        assert!(!text.contains("clean"), "{text}");
        assert!(text.ends_with("2 scenarios: 1 matched, 1 failed, 0 skipped"), "{text}");
    }
}
