//! Rendering test results for humans.
//!
//! Formatting is diagnostics only: nothing in the engine depends on these
//! strings for correctness.

use std::fmt::Debug;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::runner::TestResult;

/// Render any generated value for a report.
///
/// Uses the value's `Debug` form; a `Debug` implementation that panics is
/// caught and replaced with a placeholder so reporting can never take down a
/// run.
pub fn render_value<T: Debug>(value: &T) -> String {
    catch_unwind(AssertUnwindSafe(|| format!("{:?}", value)))
        .unwrap_or_else(|_| "<unrenderable value>".to_string())
}

/// Custom rendering of a [`TestResult`].
pub trait OutputFormatter {
    /// Format a finished run for display.
    fn format(&self, name: &str, result: &TestResult) -> String;
}

/// Terse single-paragraph output.
#[derive(Debug, Clone, Default)]
pub struct DefaultFormatter;

impl OutputFormatter for DefaultFormatter {
    fn format(&self, name: &str, result: &TestResult) -> String {
        match result {
            TestResult::Success { num_success, .. } => {
                format!("{}: OK, passed {} trials", name, num_success)
            }
            TestResult::Failure {
                num_success,
                case,
                description,
                num_shrinks,
                counterexample,
            } => {
                format!(
                    "{}: FAILED after {} passing trials\n  {}\n  counterexample ({} shrinks): {}\n  replay: seed {} size {}",
                    name, num_success, description, num_shrinks, counterexample, case.seed, case.size
                )
            }
            TestResult::GaveUp {
                num_success,
                description,
            } => {
                format!(
                    "{}: GAVE UP after {} passing trials: {}",
                    name, num_success, description
                )
            }
        }
    }
}

/// Output that also includes the tag distribution of passing runs.
#[derive(Debug, Clone, Default)]
pub struct VerboseFormatter;

impl OutputFormatter for VerboseFormatter {
    fn format(&self, name: &str, result: &TestResult) -> String {
        let mut out = DefaultFormatter.format(name, result);
        if let TestResult::Success { num_success, tags } = result {
            for (tag, count) in tags {
                let percent = 100.0 * *count as f64 / *num_success as f64;
                out.push_str(&format!("\n  {:5.1}% {}", percent, tag));
            }
        }
        out
    }
}
