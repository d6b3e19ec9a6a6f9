//! The test-case lifecycle: run one trial, shrink failures, schedule trials.
//!
//! A property is any `Fn(&mut Case, &T) -> R` where `R` converts into a
//! [`Verdict`]: return `bool`, use `assert!` and return `()`, or return a
//! `Result`/[`Verdict`] directly. Panics raised while evaluating the property
//! are captured here at the case boundary and treated as failures; they never
//! escape further.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::config::Config;
use crate::error::{IntoVerdict, Verdict};
use crate::gen::{Gen, Size};
use crate::report::render_value;
use crate::rng::{Source, avalanche, random_seed};
use crate::shrinkable::Shrinkable;

/// The triple that fully determines one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    /// Ordinal of the trial within the run, counting discards.
    pub index: usize,
    /// Seed for this trial's random source.
    pub seed: u64,
    /// Size hint for this trial.
    pub size: Size,
}

/// Outcome of a single trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseResult {
    /// The property held; carries any classification tags it emitted.
    Success { tags: Vec<String> },
    /// The property did not hold.
    Failure { description: String },
    /// A precondition was not met; the trial does not count either way.
    Discard { description: String },
}

/// Terminal outcome of a whole check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    /// Every required trial passed.
    Success {
        num_success: usize,
        /// How often each classification tag was emitted by passing trials.
        tags: BTreeMap<String, usize>,
    },
    /// A trial failed; carries the shrunk counterexample.
    Failure {
        num_success: usize,
        /// The trial that first failed; replaying it reproduces the failure.
        case: TestCase,
        /// The original failure description.
        description: String,
        /// Accepted shrink steps between the original and minimal case.
        num_shrinks: usize,
        /// Rendered minimal counterexample.
        counterexample: String,
    },
    /// The discard budget was exhausted before enough trials passed.
    GaveUp { num_success: usize, description: String },
}

impl TestResult {
    /// True for [`TestResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, TestResult::Success { .. })
    }

    /// True for [`TestResult::Failure`].
    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Failure { .. })
    }

    /// True for [`TestResult::GaveUp`].
    pub fn is_gave_up(&self) -> bool {
        matches!(self, TestResult::GaveUp { .. })
    }

    /// The rendered minimal counterexample, if this is a failure.
    pub fn counterexample(&self) -> Option<&str> {
        match self {
            TestResult::Failure { counterexample, .. } => Some(counterexample),
            _ => None,
        }
    }
}

/// Per-trial context handed to the property; carries the tag side channel.
#[derive(Debug, Default)]
pub struct Case {
    tags: Vec<String>,
}

impl Case {
    fn new() -> Self {
        Case::default()
    }

    /// Emit a classification tag for this trial.
    ///
    /// Tags from passing trials are aggregated into the final distribution;
    /// tags from failing or discarded trials are dropped.
    pub fn classify(&mut self, label: impl Into<String>) {
        self.tags.push(label.into());
    }
}

/// Evaluate a property against one value, capturing panics at this boundary.
fn eval_property<T, P, R>(property: &P, value: &T) -> CaseResult
where
    P: Fn(&mut Case, &T) -> R,
    R: IntoVerdict,
{
    let mut case = Case::new();
    let verdict = catch_unwind(AssertUnwindSafe(|| {
        property(&mut case, value).into_verdict()
    }));
    match verdict {
        Ok(Verdict::Pass) => CaseResult::Success { tags: case.tags },
        Ok(Verdict::Fail(description)) => CaseResult::Failure { description },
        Ok(Verdict::Discard(description)) => CaseResult::Discard { description },
        Err(payload) => CaseResult::Failure {
            description: panic_message(payload),
        },
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "property panicked".to_string()
    }
}

/// Greedy walk over a failing value's shrink tree.
///
/// Each candidate that still fails becomes the new current value and the walk
/// restarts at its candidates; siblings of an accepted candidate are never
/// revisited, and the subtrees of candidates that pass are never entered.
/// Returns the local minimum and the number of accepted shrinks.
pub fn shrink_search<T, F>(failing: &Shrinkable<T>, mut still_fails: F) -> (T, usize)
where
    T: Clone + 'static,
    F: FnMut(&T) -> bool,
{
    let mut current = failing.clone();
    let mut num_shrinks = 0;
    let mut candidates = current.shrinks();
    while let Some((candidate, rest)) = candidates.next() {
        if still_fails(candidate.value_ref()) {
            current = candidate;
            num_shrinks += 1;
            candidates = current.shrinks();
        } else {
            candidates = rest;
        }
    }
    (current.value(), num_shrinks)
}

/// Check a property with the default [`Config`].
pub fn check<T, P, R>(gen: &Gen<T>, property: P) -> TestResult
where
    T: Clone + Debug + 'static,
    P: Fn(&mut Case, &T) -> R,
    R: IntoVerdict,
{
    check_with_config(&Config::default(), gen, property)
}

/// Check a property: run trials until enough pass, a trial fails (then
/// shrink), or the discard budget runs out.
///
/// # Panics
///
/// Panics if the configuration fails validation; an unusable configuration is
/// a programmer error, not a test outcome.
pub fn check_with_config<T, P, R>(config: &Config, gen: &Gen<T>, property: P) -> TestResult
where
    T: Clone + Debug + 'static,
    P: Fn(&mut Case, &T) -> R,
    R: IntoVerdict,
{
    if let Err(e) = config.validate() {
        panic!("{}", e);
    }
    let base_seed = config.seed.unwrap_or_else(random_seed);
    let mut num_success = 0usize;
    let mut num_discarded = 0usize;
    let mut recent_discards = 0usize;
    let mut index = 0usize;
    let mut tags: BTreeMap<String, usize> = BTreeMap::new();
    let mut last_discard: Option<String> = None;

    loop {
        if num_success >= config.max_success {
            return TestResult::Success { num_success, tags };
        }
        if num_discarded > config.max_success * config.max_discard_ratio {
            let mut description = format!(
                "gave up after {} of {} trials passed and {} were discarded",
                num_success, config.max_success, num_discarded
            );
            if let Some(reason) = last_discard {
                description.push_str(&format!(" (last discard: {})", reason));
            }
            return TestResult::GaveUp {
                num_success,
                description,
            };
        }

        let scheduled = scheduled_size(num_success, config.max_success, config.max_size);
        let size = scheduled
            .saturating_add(recent_discards as Size / 10)
            .min(config.max_size);
        let seed = base_seed.wrapping_add(avalanche(
            base_seed
                .wrapping_add(num_success as u64)
                .wrapping_add(recent_discards as u64),
        ));
        let case = TestCase { index, seed, size };
        index += 1;

        let shrinkable = match gen.run(Source::new(case.seed), case.size) {
            Ok(shrinkable) => shrinkable,
            Err(gen_err) => {
                // Engine-level condition, same budget as a user discard but
                // distinguishable in diagnostics.
                num_discarded += 1;
                recent_discards += 1;
                last_discard = Some(format!("generation failed: {}", gen_err));
                continue;
            }
        };

        match eval_property(&property, shrinkable.value_ref()) {
            CaseResult::Success { tags: case_tags } => {
                num_success += 1;
                recent_discards = 0;
                for tag in case_tags {
                    *tags.entry(tag).or_insert(0) += 1;
                }
            }
            CaseResult::Discard { description } => {
                num_discarded += 1;
                recent_discards += 1;
                last_discard = Some(description);
            }
            CaseResult::Failure { description } => {
                let (minimal, num_shrinks) = shrink_search(&shrinkable, |value| {
                    matches!(
                        eval_property(&property, value),
                        CaseResult::Failure { .. }
                    )
                });
                return TestResult::Failure {
                    num_success,
                    case,
                    description,
                    num_shrinks,
                    counterexample: render_value(&minimal),
                };
            }
        }
    }
}

/// Spread sizes evenly over `[0, max_size]` across the scheduled successes.
///
/// The final trial is pinned to `max_size`, so the maximum is exercised at
/// least once even when `max_success` does not divide evenly.
fn scheduled_size(num_success: usize, max_success: usize, max_size: Size) -> Size {
    if num_success + 1 >= max_success {
        return max_size;
    }
    ((num_success as u64 * (max_size as u64 + 1)) / max_success as u64) as Size
}
