//! Recommended user-visible recovery.
//!
//! The core never ends the process on a recoverable failure. It reports the
//! signal and this recommendation; the outermost layer presents both.

use std::fmt;

use crate::failure::{FailureKind, FailureSignal};

/// What the outermost layer should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Stop the task and show why.
    Abort { message: String },
    /// Ask for (or compute) corrected input and retry.
    RetryCorrected,
    /// Free resources, then retry.
    RetryAfterRelease,
    /// Retry with the defined default behaviour.
    RetryDefault,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort { message } => write!(f, "abort: {message}"),
            Self::RetryCorrected => f.write_str("retry with corrected input"),
            Self::RetryAfterRelease => f.write_str("release resources and retry"),
            Self::RetryDefault => f.write_str("retry with default behaviour"),
        }
    }
}

/// Recommendation for a failure that reached the outermost layer.
pub fn recommend(signal: &FailureSignal) -> RecoveryAction {
    match signal.kind() {
        FailureKind::InvalidArgument
        | FailureKind::Domain
        | FailureKind::Length
        | FailureKind::OutOfRange => RecoveryAction::RetryCorrected,
        FailureKind::Range | FailureKind::Overflow | FailureKind::Underflow => {
            RecoveryAction::RetryDefault
        }
        FailureKind::Allocation => RecoveryAction::RetryAfterRelease,
        FailureKind::Any
        | FailureKind::Logic
        | FailureKind::Runtime
        | FailureKind::Type
        | FailureKind::ContractViolation => RecoveryAction::Abort {
            message: signal.to_string(),
        },
    }
}
