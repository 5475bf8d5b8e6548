//! Outcomes of scenario runs and the diff-style report printed for them.

use std::fmt;

use snipcheck_types::ValidationError;

use crate::scenario::ScenarioCase;

/// What happened when one scenario was validated.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The validator returned exactly the listed errors.
    Matched,
    /// `# skip:` with its reason.
    Skipped(String),
    /// The validator returned something else.
    Mismatch { actual: Vec<ValidationError> },
    /// The case could not be run: bad directives or an engine failure.
    Invalid(String),
}

impl Outcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched)
    }
}

/// Every case of a scenario file paired with its outcome.
#[derive(Debug, Default)]
pub struct ScenarioReport<'a> {
    pub cases: Vec<(&'a ScenarioCase, Outcome)>,
}

impl<'a> ScenarioReport<'a> {
    pub fn push(&mut self, case: &'a ScenarioCase, outcome: Outcome) {
        self.cases.push((case, outcome));
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases that were neither matched nor skipped.
    pub fn failures(&self) -> impl Iterator<Item = &(&'a ScenarioCase, Outcome)> {
        self.cases
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, Outcome::Matched | Outcome::Skipped(_)))
    }

    pub fn all_matched(&self) -> bool {
        self.failures().next().is_none()
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.cases.iter().filter(|(_, o)| pred(o)).count()
    }
}

impl fmt::Display for ScenarioReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (case, outcome) in self.failures() {
            writeln!(f, "{} (line {}): {}", case.name, case.line_number, case.input)?;
            match outcome {
                Outcome::Mismatch { actual } => write_diff(f, &case.expected, actual)?,
                Outcome::Invalid(message) => writeln!(f, "  ! {message}")?,
                Outcome::Matched | Outcome::Skipped(_) => {}
            }
        }
        write!(
            f,
            "{} scenarios: {} matched, {} failed, {} skipped",
            self.len(),
            self.count(Outcome::is_matched),
            self.failures().count(),
            self.count(|o| matches!(o, Outcome::Skipped(_))),
        )
    }
}

/// Line-by-line listing: agreeing lines indented, disagreeing ones as
/// `-` expected and `+` actual.
fn write_diff(
    f: &mut fmt::Formatter<'_>,
    expected: &[String],
    actual: &[ValidationError],
) -> fmt::Result {
    for i in 0..expected.len().max(actual.len()) {
        let want = expected.get(i);
        let got = actual.get(i).map(ToString::to_string);
        match (want, got) {
            (Some(want), Some(got)) if line_matches(&got, want) => writeln!(f, "    {got}")?,
            (want, got) => {
                if let Some(want) = want {
                    writeln!(f, "  - {want}")?;
                }
                if let Some(got) = got {
                    writeln!(f, "  + {got}")?;
                }
            }
        }
    }
    Ok(())
}

/// One expected line against one rendered error; a trailing `*` matches any
/// suffix.
pub fn line_matches(actual: &str, expected: &str) -> bool {
    match expected.strip_suffix('*') {
        Some(prefix) => actual.starts_with(prefix),
        None => actual == expected,
    }
}
