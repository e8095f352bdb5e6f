//! Scoped unwinding and the propagation record.
//!
//! A failure propagates by returning `Err` through `?`. Every scope it
//! leaves drops its locals in reverse declaration order, so resources held
//! by [`ScopedResource`] guards are released before any outer handler
//! runs. The [`PropagationRecord`] makes that order observable.
//!
//! ## Event Order for A → B → C, C raises, A handles
//!
//! ```text
//! Acquired(A) Acquired(B) Acquired(C)
//! Released(C) Released(B) Observed(A) Handled(A)
//! ```
//!
//! Single-threaded: the record is `Rc<RefCell<…>>` and is not `Send`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::failure::{Fallible, FailureKind, FailureSignal, SignalId};

// ─── Events ─────────────────────────────────────────────────────────

/// One step of a propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagationEvent {
    /// A scope took ownership of a resource.
    Acquired { scope: String, resource: String },
    /// A scope released a resource (normal exit or unwinding).
    Released { scope: String, resource: String },
    /// A matching handler received a signal.
    Observed { scope: String, kind: FailureKind, id: SignalId },
    /// A handler re-raised the signal it observed.
    Rethrown { scope: String, id: SignalId },
    /// A handler resolved the signal.
    Handled { scope: String, id: SignalId },
    /// The signal reached the outermost frame unhandled.
    Terminated { scope: String, id: SignalId },
}

impl PropagationEvent {
    pub fn scope(&self) -> &str {
        match self {
            Self::Acquired { scope, .. }
            | Self::Released { scope, .. }
            | Self::Observed { scope, .. }
            | Self::Rethrown { scope, .. }
            | Self::Handled { scope, .. }
            | Self::Terminated { scope, .. } => scope,
        }
    }
}

impl fmt::Display for PropagationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquired { scope, resource } => write!(f, "{scope}: acquire {resource}"),
            Self::Released { scope, resource } => write!(f, "{scope}: release {resource}"),
            Self::Observed { scope, kind, id } => write!(f, "{scope}: observe {kind} {id}"),
            Self::Rethrown { scope, id } => write!(f, "{scope}: rethrow {id}"),
            Self::Handled { scope, id } => write!(f, "{scope}: handle {id}"),
            Self::Terminated { scope, id } => write!(f, "{scope}: terminate {id}"),
        }
    }
}

// ─── Record ─────────────────────────────────────────────────────────

/// Ordered log of propagation events, shared by every scope of one run.
///
/// Cloning yields another handle to the same log.
#[derive(Debug, Clone, Default)]
pub struct PropagationRecord {
    events: Rc<RefCell<Vec<PropagationEvent>>>,
}

impl PropagationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: PropagationEvent) {
        tracing::trace!(%event, "propagation");
        self.events.borrow_mut().push(event);
    }

    /// Acquire a named resource owned by `scope`.
    ///
    /// The returned guard records its release when dropped.
    pub fn acquire(&self, scope: &str, resource: &str) -> ScopedResource {
        self.push(PropagationEvent::Acquired {
            scope: scope.to_string(),
            resource: resource.to_string(),
        });
        ScopedResource {
            scope: scope.to_string(),
            resource: resource.to_string(),
            record: self.clone(),
        }
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<PropagationEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Resource names released, in release order.
    pub fn released(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PropagationEvent::Released { resource, .. } => Some(resource.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resources released by `scope`, in release order.
    pub fn releases_for(&self, scope: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PropagationEvent::Released { scope: s, resource } if s == scope => {
                    Some(resource.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Resource names acquired, in acquisition order.
    pub fn acquired(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PropagationEvent::Acquired { resource, .. } => Some(resource.clone()),
                _ => None,
            })
            .collect()
    }

    /// Index of the first event satisfying `pred`.
    pub fn position(&self, pred: impl Fn(&PropagationEvent) -> bool) -> Option<usize> {
        self.events.borrow().iter().position(pred)
    }

    /// Whether every acquired resource has a matching release.
    pub fn all_released(&self) -> bool {
        let mut acquired = self.acquired();
        let mut released = self.released();
        acquired.sort();
        released.sort();
        acquired == released
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

// ─── Scoped Resource ────────────────────────────────────────────────

/// A resource released when its owning scope ends.
///
/// Release is infallible: the guard only records the event.
#[derive(Debug)]
pub struct ScopedResource {
    scope: String,
    resource: String,
    record: PropagationRecord,
}

impl ScopedResource {
    pub fn name(&self) -> &str {
        &self.resource
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Drop for ScopedResource {
    fn drop(&mut self) {
        self.record.push(PropagationEvent::Released {
            scope: std::mem::take(&mut self.scope),
            resource: std::mem::take(&mut self.resource),
        });
    }
}

// ─── Outermost Frame ────────────────────────────────────────────────

/// How a top-level run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Termination<T> {
    /// The body produced a value (possibly after inner handlers recovered).
    Completed(T),
    /// A signal escaped every handler.
    Uncaught {
        kind: FailureKind,
        message: String,
        id: SignalId,
    },
}

impl<T> Termination<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn uncaught_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Uncaught { kind, .. } => Some(*kind),
            Self::Completed(_) => None,
        }
    }
}

/// Run `body` as the outermost frame.
///
/// By the time an escaped signal reaches this frame every inner scope has
/// already been unwound. The escape is logged and recorded, and reported as
/// [`Termination::Uncaught`]; the process is left running so the caller can
/// decide what to present.
pub fn run_to_completion<T>(
    scope: &str,
    record: &PropagationRecord,
    body: impl FnOnce() -> Fallible<T>,
) -> Termination<T> {
    match body() {
        Ok(value) => Termination::Completed(value),
        Err(signal) => terminate(scope, record, signal),
    }
}

fn terminate<T>(scope: &str, record: &PropagationRecord, signal: FailureSignal) -> Termination<T> {
    tracing::error!(
        scope,
        id = %signal.id(),
        kind = %signal.kind(),
        detail = signal.message(),
        "uncaught failure"
    );
    record.push(PropagationEvent::Terminated {
        scope: scope.to_string(),
        id: signal.id(),
    });
    Termination::Uncaught {
        kind: signal.kind(),
        message: signal.message().to_string(),
        id: signal.id(),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
