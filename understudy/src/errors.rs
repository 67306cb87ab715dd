use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::entities::CallRecord;

/// Errors raised by doubles, stub registrations and verifications.
#[derive(Error, Debug, Clone)]
pub enum DoubleError {
    /// A verification query was not satisfied by the recorded invocations.
    #[error("{0}")]
    VerificationFailure(Box<VerificationFailure>),

    /// A call had no matching stub rule, no real instance to delegate to, and no default
    /// value could be returned.
    #[error("Unstubbed call `{call}`: {reason}")]
    UnstubbedCallOnStrictDouble {
        /// Rendering of the offending call
        call: String,
        /// Why no answer could be given
        reason: String,
    },

    /// A stub rule was registered with an invalid matcher/response combination.
    #[error("Invalid stubbing of `{double}.{method}`: {reason}")]
    StubConfigurationError {
        /// Name of the stubbed double
        double: String,
        /// Stubbed method
        method: String,
        /// What is wrong with the stubbing
        reason: String,
    },
}

impl DoubleError {
    /// Check if the error is a [DoubleError::VerificationFailure].
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, DoubleError::VerificationFailure(_))
    }

    /// Get the verification failure detail, if any.
    pub fn verification_failure(&self) -> Option<&VerificationFailure> {
        match self {
            DoubleError::VerificationFailure(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<VerificationFailure> for DoubleError {
    fn from(failure: VerificationFailure) -> Self {
        DoubleError::VerificationFailure(Box::new(failure))
    }
}

/// Detail of a failed verification: what was expected against what was recorded.
#[derive(Debug, Clone)]
pub struct VerificationFailure {
    /// Human readable expectation, ie: `ListApi#1.get(0) to be invoked exactly 3 times`
    pub expected: String,

    /// Human readable outcome, ie: `invoked 2 times`
    pub outcome: String,

    /// Invocations the expectation was evaluated against
    pub actual: Vec<CallRecord>,
}

impl VerificationFailure {
    pub(crate) fn new<E: Into<String>, O: Into<String>>(
        expected: E,
        outcome: O,
        actual: Vec<CallRecord>,
    ) -> Self {
        Self {
            expected: expected.into(),
            outcome: outcome.into(),
            actual,
        }
    }
}

impl Display for VerificationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Verification failure")?;
        writeln!(f, "  expected: {}", self.expected)?;
        writeln!(f, "  but: {}", self.outcome)?;
        if self.actual.is_empty() {
            write!(f, "  actual invocations: none")
        } else {
            write!(f, "  actual invocations:")?;
            for record in &self.actual {
                write!(f, "\n    {record}")?;
            }
            Ok(())
        }
    }
}
