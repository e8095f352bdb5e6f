//! Failure taxonomy and the failure signal.
//!
//! ## Hierarchy
//!
//! ```text
//! Any
//! ├── Logic ── InvalidArgument | Domain | Length | OutOfRange
//! ├── Runtime ── Range | Overflow | Underflow
//! ├── Allocation
//! ├── Type
//! └── ContractViolation
//! ```
//!
//! Handlers match a signal by its exact kind or by any ancestor
//! ([`FailureKind::is_a`]).
//!
//! ## Identity
//!
//! A [`FailureSignal`] is deliberately not `Clone`. Handlers observe it by
//! reference and either consume it or hand the very same value back to the
//! caller, so a re-raised signal keeps its kind, message and [`SignalId`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use static_assertions::{assert_impl_all, assert_not_impl_any, const_assert_eq};
use thiserror::Error;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Root of the hierarchy; a handler for `Any` is a catch-all.
    Any,
    /// Errors in the program's logic, detectable before running.
    Logic,
    /// An argument outside the accepted set.
    InvalidArgument,
    /// An argument outside the mathematical domain of the operation.
    Domain,
    /// An attempt to exceed a maximum permitted size.
    Length,
    /// An argument outside the valid index or value range.
    OutOfRange,
    /// Errors only detectable while running.
    Runtime,
    /// A result not representable in the destination type.
    Range,
    /// Arithmetic overflow.
    Overflow,
    /// Arithmetic underflow.
    Underflow,
    /// A resource could not be obtained.
    Allocation,
    /// A dynamic type check failed.
    Type,
    /// An operation declared infallible raised anyway.
    ContractViolation,
}

impl FailureKind {
    /// Every kind, parents before children.
    pub const ALL: [FailureKind; 13] = [
        Self::Any,
        Self::Logic,
        Self::InvalidArgument,
        Self::Domain,
        Self::Length,
        Self::OutOfRange,
        Self::Runtime,
        Self::Range,
        Self::Overflow,
        Self::Underflow,
        Self::Allocation,
        Self::Type,
        Self::ContractViolation,
    ];

    /// Direct ancestor, `None` for [`FailureKind::Any`].
    pub const fn parent(self) -> Option<FailureKind> {
        match self {
            Self::Any => None,
            Self::Logic
            | Self::Runtime
            | Self::Allocation
            | Self::Type
            | Self::ContractViolation => Some(Self::Any),
            Self::InvalidArgument | Self::Domain | Self::Length | Self::OutOfRange => {
                Some(Self::Logic)
            }
            Self::Range | Self::Overflow | Self::Underflow => Some(Self::Runtime),
        }
    }

    /// Whether `self` equals `ancestor` or descends from it.
    pub fn is_a(self, ancestor: FailureKind) -> bool {
        self.ancestors().any(|k| k == ancestor)
    }

    /// Self first, then each ancestor up to [`FailureKind::Any`].
    pub fn ancestors(self) -> impl Iterator<Item = FailureKind> {
        std::iter::successors(Some(self), |k| k.parent())
    }

    /// Distance from the root.
    pub fn depth(self) -> usize {
        self.ancestors().count() - 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "failure",
            Self::Logic => "logic failure",
            Self::InvalidArgument => "invalid argument",
            Self::Domain => "domain failure",
            Self::Length => "length failure",
            Self::OutOfRange => "out of range",
            Self::Runtime => "runtime failure",
            Self::Range => "range failure",
            Self::Overflow => "overflow",
            Self::Underflow => "underflow",
            Self::Allocation => "allocation failure",
            Self::Type => "type failure",
            Self::ContractViolation => "contract violation",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Process-unique identity of a raised signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A raised failure: classification, description and identity.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct FailureSignal {
    kind: FailureKind,
    message: String,
    id: SignalId,
}

impl FailureSignal {
    /// Raise a new signal.
    pub fn raise(kind: FailureKind, message: impl Into<String>) -> Self {
        let signal = Self {
            kind,
            message: message.into(),
            id: SignalId::next(),
        };
        tracing::debug!(id = %signal.id, kind = %signal.kind, detail = %signal.message, "raised");
        signal
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::InvalidArgument, message)
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Domain, message)
    }

    pub fn length(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Length, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::OutOfRange, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Range, message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Overflow, message)
    }

    pub fn underflow(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Underflow, message)
    }

    pub fn allocation(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Allocation, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::raise(FailureKind::Type, message)
    }

    #[inline]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Whether a handler for `ancestor` would catch this signal.
    #[inline]
    pub fn is_a(&self, ancestor: FailureKind) -> bool {
        self.kind.is_a(ancestor)
    }
}

/// Result of a fallible operation.
pub type Fallible<T> = Result<T, FailureSignal>;

const_assert_eq!(FailureKind::ALL.len(), 13);
assert_impl_all!(FailureSignal: std::error::Error, Send, Sync);
assert_not_impl_any!(FailureSignal: Clone, Copy);

// ─── Tests ──────────────────────────────────────────────────────────
