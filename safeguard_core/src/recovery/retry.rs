//! Correct-and-retry recovery for out-of-range input.

use safeguard_common::consts::{BYTE_MAX, BYTE_MIN};

use crate::failure::{Fallible, FailureKind};
use crate::ops::to_char_safe;

/// Convert to a byte, clamping out-of-range input and retrying once.
///
/// Only `OutOfRange` is recovered; any other failure is re-raised as is.
#[must_use = "a conversion failure must be inspected"]
pub fn to_char_clamped(value: i64) -> Fallible<u8> {
    match to_char_safe(value) {
        Err(signal) if signal.kind() == FailureKind::OutOfRange => {
            let corrected = value.clamp(BYTE_MIN, BYTE_MAX);
            tracing::debug!(value, corrected, id = %signal.id(), "clamped and retried");
            to_char_safe(corrected)
        }
        other => other,
    }
}

/// Which local recoveries a caller allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryPolicy {
    pub clamp_out_of_range: bool,
}

impl RecoveryPolicy {
    /// Byte conversion under this policy.
    #[must_use = "a conversion failure must be inspected"]
    pub fn to_char(&self, value: i64) -> Fallible<u8> {
        if self.clamp_out_of_range {
            to_char_clamped(value)
        } else {
            to_char_safe(value)
        }
    }
}
