//! Test utilities for snipcheck.
//!
//! Parses and runs the scenario file format (`tests/scenarios/*.test`):
//! snippets with their host context and the validation errors they must
//! produce. Failing cases are reported as the snippet followed by a diff of
//! expected and actual errors.

pub mod report;
pub mod scenario;

pub use report::{Outcome, ScenarioReport};
pub use scenario::{ScenarioCase, parse_scenarios, run_scenarios, scenario_validator};
