//! Resources whose cleanup can fail.
//!
//! `Drop` runs during unwinding and must not fail. A resource whose release
//! step can go wrong therefore exposes it as [`Finalize::finalize`], called
//! explicitly on the success path; its failure is returned to the caller.
//! If the owner never finalizes (because a failure is unwinding past it),
//! `Drop` falls back to a silent, infallible discard.

use crate::failure::{Fallible, FailureSignal};

/// Explicit, fallible release.
pub trait Finalize {
    type Output;

    /// Complete the resource's work and release it.
    ///
    /// # Errors
    ///
    /// Returns the failure instead of raising it from `Drop`.
    fn finalize(self) -> Fallible<Self::Output>;
}

// ─── Journal ────────────────────────────────────────────────────────

/// Bounded, append-only log shared by its writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    capacity: usize,
    entries: Vec<String>,
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }

    /// Open a writer that stages entries until finalized.
    pub fn writer(&mut self) -> JournalWriter<'_> {
        JournalWriter {
            journal: self,
            staged: Vec::new(),
            finalized: false,
        }
    }
}

/// Staging writer over a [`Journal`].
///
/// Entries become visible only when [`Finalize::finalize`] succeeds, and
/// then all at once.
#[derive(Debug)]
pub struct JournalWriter<'j> {
    journal: &'j mut Journal,
    staged: Vec<String>,
    finalized: bool,
}

impl JournalWriter<'_> {
    pub fn stage(&mut self, entry: impl Into<String>) {
        self.staged.push(entry.into());
    }

    pub fn staged(&self) -> usize {
        self.staged.len()
    }
}

impl Finalize for JournalWriter<'_> {
    /// Number of entries committed.
    type Output = usize;

    /// Commit all staged entries.
    ///
    /// All-or-nothing: on `Overflow` or `Allocation` the journal is left
    /// exactly as it was.
    fn finalize(mut self) -> Fallible<usize> {
        self.finalized = true;
        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();

        if count > self.journal.remaining() {
            return Err(FailureSignal::overflow(format!(
                "{count} staged entries exceed {} remaining of {}",
                self.journal.remaining(),
                self.journal.capacity
            )));
        }
        self.journal
            .entries
            .try_reserve(count)
            .map_err(|e| FailureSignal::allocation(format!("cannot grow journal: {e}")))?;
        self.journal.entries.extend(staged);

        tracing::debug!(count, total = self.journal.len(), "journal committed");
        Ok(count)
    }
}

impl Drop for JournalWriter<'_> {
    fn drop(&mut self) {
        if !self.finalized && !self.staged.is_empty() {
            tracing::warn!(
                discarded = self.staged.len(),
                "journal writer dropped without finalize"
            );
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
