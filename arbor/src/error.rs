//! Error types and the property outcome protocol.

use std::fmt;

/// A generator could not produce a conforming value within its retry budget.
///
/// Generation failures are engine-level conditions, not property failures: the
/// check loop converts them into discarded trials, and their rendered form is
/// prefixed so they remain distinguishable from user-level discards in
/// diagnostics.
#[derive(Debug, Clone)]
pub enum GenerationError {
    /// A filtered generator (`such_that`) exhausted its retry budget.
    RetriesExhausted { what: String, attempts: u32 },

    /// A selection combinator had nothing to select from.
    NoChoices { what: String },

    /// An associative container could not find enough distinct keys.
    DistinctKeysExhausted { needed: usize, attempts: u32 },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::RetriesExhausted { what, attempts } => {
                write!(f, "gave up generating {} after {} attempts", what, attempts)
            }
            GenerationError::NoChoices { what } => {
                write!(f, "{} has no alternatives to choose from", what)
            }
            GenerationError::DistinctKeysExhausted { needed, attempts } => {
                write!(
                    f,
                    "could not draw {} distinct keys within {} attempts",
                    needed, attempts
                )
            }
        }
    }
}

impl std::error::Error for GenerationError {}

impl GenerationError {
    /// Create a retries-exhausted error.
    pub fn retries_exhausted(what: impl Into<String>, attempts: u32) -> Self {
        GenerationError::RetriesExhausted {
            what: what.into(),
            attempts,
        }
    }

    /// Create a no-choices error.
    pub fn no_choices(what: impl Into<String>) -> Self {
        GenerationError::NoChoices { what: what.into() }
    }
}

/// The outcome of evaluating a property against one generated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The property holds for this input.
    Pass,
    /// The property does not hold; carries a description of the violation.
    Fail(String),
    /// The input did not meet a precondition; the trial does not count.
    Discard(String),
}

impl Verdict {
    /// Shorthand for a failure with a description.
    pub fn fail(description: impl Into<String>) -> Self {
        Verdict::Fail(description.into())
    }

    /// Shorthand for a discard with a description.
    pub fn discard(description: impl Into<String>) -> Self {
        Verdict::Discard(description.into())
    }
}

/// Conversion of convenient property return types into a [`Verdict`].
///
/// Properties may return `bool` (`false` fails), `()` (always passes, pair it
/// with `assert!`), a `Result` whose error renders as the failure description,
/// or a [`Verdict`] directly.
pub trait IntoVerdict {
    fn into_verdict(self) -> Verdict;
}

impl IntoVerdict for Verdict {
    fn into_verdict(self) -> Verdict {
        self
    }
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> Verdict {
        if self {
            Verdict::Pass
        } else {
            Verdict::Fail("property returned false".to_string())
        }
    }
}

impl IntoVerdict for () {
    fn into_verdict(self) -> Verdict {
        Verdict::Pass
    }
}

impl<E: fmt::Display> IntoVerdict for Result<(), E> {
    fn into_verdict(self) -> Verdict {
        match self {
            Ok(()) => Verdict::Pass,
            Err(e) => Verdict::Fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_display() {
        let e = GenerationError::retries_exhausted("filtered integer", 100);
        assert_eq!(
            e.to_string(),
            "gave up generating filtered integer after 100 attempts"
        );

        let e = GenerationError::no_choices("one_of");
        assert_eq!(e.to_string(), "one_of has no alternatives to choose from");

        let e = GenerationError::DistinctKeysExhausted {
            needed: 5,
            attempts: 100,
        };
        assert_eq!(
            e.to_string(),
            "could not draw 5 distinct keys within 100 attempts"
        );
    }

    #[test]
    fn bool_verdict_conversion() {
        assert_eq!(true.into_verdict(), Verdict::Pass);
        assert!(matches!(false.into_verdict(), Verdict::Fail(_)));
    }

    #[test]
    fn unit_always_passes() {
        assert_eq!(().into_verdict(), Verdict::Pass);
    }

    #[test]
    fn result_verdict_conversion() {
        let ok: Result<(), String> = Ok(());
        assert_eq!(ok.into_verdict(), Verdict::Pass);

        let err: Result<(), String> = Err("left != right".to_string());
        assert_eq!(err.into_verdict(), Verdict::Fail("left != right".to_string()));
    }

    #[test]
    fn verdict_shorthands() {
        assert_eq!(Verdict::fail("bad"), Verdict::Fail("bad".to_string()));
        assert_eq!(
            Verdict::discard("unmet precondition"),
            Verdict::Discard("unmet precondition".to_string())
        );
    }
}
