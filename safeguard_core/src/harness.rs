//! Verification harness.
//!
//! Runs fallible operations against expectations and refuses to pass when a
//! result was thrown away without being looked at.
//!
//! ## Inspection Ledger
//!
//! [`Harness::track`] wraps a result in a [`Tracked`]. Consuming it with
//! [`Tracked::into_result`] or looking at it with [`Tracked::peek`] marks it
//! inspected. Dropping it otherwise records a discard in the ledger; the
//! drop itself never panics. [`Harness::finish`] fails on any discard and on
//! any tracked result still alive.
//!
//! ```rust
//! use safeguard_core::harness::{Expectation, Harness};
//! use safeguard_core::failure::FailureKind;
//! use safeguard_core::ops::{substring_safe, to_char_safe};
//!
//! let mut harness = Harness::new("ops");
//! harness.check("in range", to_char_safe(66), Expectation::Value(b'B'));
//! harness.check("past end", substring_safe("abc", 4), Expectation::Fails(FailureKind::Logic));
//! let report = harness.finish().unwrap();
//! assert_eq!(report.passed(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use thiserror::Error;

use crate::failure::{Fallible, FailureKind, FailureSignal};

// ─── Ledger ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Ledger {
    issued: Cell<usize>,
    inspected: Cell<usize>,
    discarded: RefCell<Vec<String>>,
}

impl Ledger {
    fn outstanding(&self) -> usize {
        self.issued.get() - self.inspected.get() - self.discarded.borrow().len()
    }
}

/// Records a discard unless disarmed before drop.
#[derive(Debug)]
struct DiscardGuard {
    label: String,
    ledger: Rc<Ledger>,
    armed: bool,
}

impl DiscardGuard {
    fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            self.ledger.inspected.set(self.ledger.inspected.get() + 1);
        }
    }
}

impl Drop for DiscardGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(label = %self.label, "fallible result discarded without inspection");
            self.ledger
                .discarded
                .borrow_mut()
                .push(std::mem::take(&mut self.label));
        }
    }
}

/// A result that must be inspected before it goes away.
#[must_use = "dropping a tracked result uninspected fails the harness"]
#[derive(Debug)]
pub struct Tracked<T> {
    result: Fallible<T>,
    guard: DiscardGuard,
}

impl<T> Tracked<T> {
    /// Take the result, marking it inspected.
    pub fn into_result(self) -> Fallible<T> {
        let Tracked { result, mut guard } = self;
        guard.disarm();
        result
    }

    /// Look at the result in place, marking it inspected.
    pub fn peek(&mut self) -> Result<&T, &FailureSignal> {
        self.guard.disarm();
        self.result.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.guard.label
    }
}

// ─── Expectations ───────────────────────────────────────────────────

/// Expected result of one case.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation<T> {
    /// Succeeds with exactly this value.
    Value(T),
    /// Succeeds with any value.
    Succeeds,
    /// Fails with this kind or one of its descendants.
    Fails(FailureKind),
}

impl<T: PartialEq + Debug> Expectation<T> {
    fn evaluate(&self, result: &Fallible<T>) -> Result<(), String> {
        match (self, result) {
            (Self::Value(want), Ok(got)) if want == got => Ok(()),
            (Self::Value(want), Ok(got)) => Err(format!("expected {want:?}, got {got:?}")),
            (Self::Succeeds, Ok(_)) => Ok(()),
            (Self::Fails(kind), Err(signal)) if signal.is_a(*kind) => Ok(()),
            (Self::Fails(kind), Err(signal)) => {
                Err(format!("expected {kind}, got {signal}"))
            }
            (Self::Fails(kind), Ok(got)) => Err(format!("expected {kind}, got Ok({got:?})")),
            (Self::Value(_) | Self::Succeeds, Err(signal)) => {
                Err(format!("expected success, got {signal}"))
            }
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────

/// Outcome of one checked case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub case: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Summary of a finished harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub harness: String,
    pub cases: Vec<CaseResult>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| !c.passed)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}/{} passed", self.harness, self.passed(), self.total())?;
        for case in self.failed() {
            write!(f, "  - {}", case.case)?;
            if let Some(detail) = &case.detail {
                write!(f, ": {detail}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Why a harness did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// Tracked results were dropped without inspection.
    #[error("{count} fallible result(s) discarded without inspection: {labels:?}")]
    DiscardedResults { count: usize, labels: Vec<String> },

    /// Tracked results were still alive when the harness finished.
    #[error("{count} tracked result(s) still outstanding at finish")]
    Outstanding { count: usize },

    /// Cases disagreed with their expectations.
    #[error("{failed} of {total} case(s) failed")]
    Mismatches { failed: usize, total: usize, report: Report },
}

// ─── Harness ────────────────────────────────────────────────────────

/// Collects checked cases and the inspection ledger for one run.
#[derive(Debug)]
pub struct Harness {
    name: String,
    ledger: Rc<Ledger>,
    cases: Vec<CaseResult>,
}

impl Harness {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ledger: Rc::default(),
            cases: Vec::new(),
        }
    }

    /// Wrap `result` so that discarding it is detected.
    pub fn track<T>(&self, label: &str, result: Fallible<T>) -> Tracked<T> {
        self.ledger.issued.set(self.ledger.issued.get() + 1);
        Tracked {
            result,
            guard: DiscardGuard {
                label: label.to_string(),
                ledger: Rc::clone(&self.ledger),
                armed: true,
            },
        }
    }

    /// Compare `result` with `expect` and record the case.
    ///
    /// Returns whether the case passed.
    pub fn check<T: PartialEq + Debug>(
        &mut self,
        case: &str,
        result: Fallible<T>,
        expect: Expectation<T>,
    ) -> bool {
        let verdict = expect.evaluate(&result);
        let passed = verdict.is_ok();
        if let Err(detail) = &verdict {
            tracing::warn!(harness = %self.name, case, %detail, "case failed");
        }
        self.cases.push(CaseResult {
            case: case.to_string(),
            passed,
            detail: verdict.err(),
        });
        passed
    }

    /// Check a tracked result, marking it inspected.
    pub fn check_tracked<T: PartialEq + Debug>(
        &mut self,
        case: &str,
        tracked: Tracked<T>,
        expect: Expectation<T>,
    ) -> bool {
        self.check(case, tracked.into_result(), expect)
    }

    /// Record a case whose verdict was computed elsewhere.
    pub fn record(&mut self, case: &str, passed: bool, detail: Option<String>) {
        self.cases.push(CaseResult {
            case: case.to_string(),
            passed,
            detail,
        });
    }

    pub fn discarded(&self) -> Vec<String> {
        self.ledger.discarded.borrow().clone()
    }

    /// Close the run.
    ///
    /// Ledger problems take precedence over mismatches.
    pub fn finish(self) -> Result<Report, HarnessError> {
        let discarded = self.discarded();
        if !discarded.is_empty() {
            return Err(HarnessError::DiscardedResults {
                count: discarded.len(),
                labels: discarded,
            });
        }
        let outstanding = self.ledger.outstanding();
        if outstanding > 0 {
            return Err(HarnessError::Outstanding { count: outstanding });
        }

        let report = Report {
            harness: self.name,
            cases: self.cases,
        };
        let failed = report.failed().count();
        if failed > 0 {
            return Err(HarnessError::Mismatches {
                failed,
                total: report.total(),
                report,
            });
        }
        tracing::info!(harness = %report.harness, cases = report.total(), "harness passed");
        Ok(report)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(all(test, not(feature = "strict-checks")))]
mod tests {
    use super::*;
    use crate::ops::{substring_safe, to_char_safe};

    #[test]
    fn expectations_pass_and_fail() {
        let mut harness = Harness::new("ops");
        assert!(harness.check("ok", to_char_safe(65), Expectation::Value(b'A')));
        assert!(harness.check("any", to_char_safe(0), Expectation::Succeeds));
        assert!(harness.check(
            "ancestor",
            substring_safe("abc", 10),
            Expectation::Fails(FailureKind::Logic)
        ));
        assert!(!harness.check(
            "wrong kind",
            to_char_safe(300),
            Expectation::Fails(FailureKind::Runtime)
        ));

        match harness.finish() {
            Err(HarnessError::Mismatches { failed, total, report }) => {
                assert_eq!((failed, total), (1, 4));
                let text = report.to_string();
                assert!(text.contains("3/4 passed"));
                assert!(text.contains("wrong kind: expected runtime failure, got out of range"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn discarded_tracked_result_fails_harness() {
        let mut harness = Harness::new("ledger");
        let kept = harness.track("kept", to_char_safe(1));
        {
            let _dropped = harness.track("dropped", to_char_safe(999));
        }
        harness.check_tracked("kept", kept, Expectation::Value(1));

        assert_eq!(harness.discarded(), vec!["dropped"]);
        assert_eq!(
            harness.finish(),
            Err(HarnessError::DiscardedResults {
                count: 1,
                labels: vec!["dropped".to_string()],
            })
        );
    }

    #[test]
    fn peek_counts_as_inspection() {
        let harness = Harness::new("peek");
        let mut tracked = harness.track("value", to_char_safe(256));
        assert_eq!(tracked.label(), "value");
        assert_eq!(tracked.peek().unwrap_err().kind(), FailureKind::OutOfRange);
        drop(tracked);
        assert!(harness.finish().is_ok());
    }

    #[test]
    fn live_tracked_result_is_outstanding() {
        let harness = Harness::new("outstanding");
        let tracked = harness.track("late", to_char_safe(3));
        let ledger = Rc::clone(&harness.ledger);
        assert_eq!(harness.finish(), Err(HarnessError::Outstanding { count: 1 }));
        assert_eq!(tracked.into_result().unwrap(), 3);
        assert_eq!(ledger.outstanding(), 0);
    }

    #[test]
    fn clean_run_reports_every_case() {
        let mut harness = Harness::new("clean");
        harness.check("a", to_char_safe(10), Expectation::Value(10));
        harness.record("external", true, None);
        let report = harness.finish().unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.passed(), 2);
    }
}
