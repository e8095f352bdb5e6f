//! Handler sites: the `try`/`catch` of the failure model.
//!
//! A [`CatchSite`] owns an ordered list of handlers, each declared for one
//! [`FailureKind`]. A signal escaping the guarded body goes to the first
//! handler, in declaration order, whose kind it `is_a`.
//!
//! ## Setup Validation
//!
//! A handler for an ancestor kind declared before a handler for one of its
//! descendants makes the descendant handler dead code. [`CatchSiteBuilder::build`]
//! rejects such a site with [`SetupError::UnreachableHandler`], which also
//! covers duplicate kinds and anything declared after a catch-all. Once a
//! site is built, the first matching handler is always the most specific.
//!
//! ## Re-raising
//!
//! Handlers see the signal by reference. A handler that cannot resolve it
//! returns [`Resolution::Rethrow`] and the site returns the original value,
//! so its kind, message and identity reach the next site intact.

use thiserror::Error;

use crate::failure::{Fallible, FailureKind, FailureSignal, SignalId};
use crate::scope::{PropagationEvent, PropagationRecord};

/// What a handler decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The failure is resolved; propagation stops here.
    Handled,
    /// Pass the original signal on to the enclosing site.
    Rethrow,
}

/// Result of running a guarded body.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The body returned normally.
    Completed(T),
    /// The body failed and a handler at this site resolved it.
    Handled { kind: FailureKind, id: SignalId },
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(v) => Some(v),
            Self::Handled { .. } => None,
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// Rejected site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A handler can never run because an earlier one already matches
    /// everything it would.
    #[error("handler #{position} for {shadowed} is unreachable: already caught by {by}")]
    UnreachableHandler {
        shadowed: FailureKind,
        by: FailureKind,
        position: usize,
    },

    /// A site with no handlers at all.
    #[error("catch site declares no handlers")]
    NoHandlers,
}

type HandlerFn<'h> = Box<dyn FnMut(&FailureSignal) -> Resolution + 'h>;

struct Handler<'h> {
    kind: FailureKind,
    callback: HandlerFn<'h>,
}

/// Builder for a [`CatchSite`].
pub struct CatchSiteBuilder<'h> {
    handlers: Vec<Handler<'h>>,
    scope: String,
    record: Option<PropagationRecord>,
}

impl<'h> CatchSiteBuilder<'h> {
    /// Declare a handler for `kind` and all of its descendants.
    pub fn on(
        mut self,
        kind: FailureKind,
        callback: impl FnMut(&FailureSignal) -> Resolution + 'h,
    ) -> Self {
        self.handlers.push(Handler {
            kind,
            callback: Box::new(callback),
        });
        self
    }

    /// Declare a catch-all handler.
    pub fn on_any(self, callback: impl FnMut(&FailureSignal) -> Resolution + 'h) -> Self {
        self.on(FailureKind::Any, callback)
    }

    /// Log observe/rethrow/handle events under `scope`.
    pub fn with_record(mut self, scope: &str, record: &PropagationRecord) -> Self {
        self.scope = scope.to_string();
        self.record = Some(record.clone());
        self
    }

    /// Validate the declaration order and build the site.
    pub fn build(self) -> Result<CatchSite<'h>, SetupError> {
        check_reachable(self.handlers.iter().map(|h| h.kind))?;
        Ok(CatchSite {
            handlers: self.handlers,
            scope: self.scope,
            record: self.record,
        })
    }
}

/// Check that no handler kind is shadowed by an earlier declaration.
pub fn check_reachable(kinds: impl IntoIterator<Item = FailureKind>) -> Result<(), SetupError> {
    let mut declared: Vec<FailureKind> = Vec::new();
    for (position, kind) in kinds.into_iter().enumerate() {
        if let Some(&by) = declared.iter().find(|&&earlier| kind.is_a(earlier)) {
            tracing::warn!(%kind, %by, position, "unreachable handler rejected");
            return Err(SetupError::UnreachableHandler {
                shadowed: kind,
                by,
                position,
            });
        }
        declared.push(kind);
    }
    if declared.is_empty() {
        return Err(SetupError::NoHandlers);
    }
    Ok(())
}

/// A validated set of handlers guarding one call site.
pub struct CatchSite<'h> {
    handlers: Vec<Handler<'h>>,
    scope: String,
    record: Option<PropagationRecord>,
}

impl<'h> CatchSite<'h> {
    pub fn builder() -> CatchSiteBuilder<'h> {
        CatchSiteBuilder {
            handlers: Vec::new(),
            scope: "catch".to_string(),
            record: None,
        }
    }

    /// Declared kinds in declaration order.
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.handlers.iter().map(|h| h.kind).collect()
    }

    /// Kind of the handler that would receive a signal of `kind`.
    pub fn handler_for(&self, kind: FailureKind) -> Option<FailureKind> {
        self.handlers.iter().map(|h| h.kind).find(|&k| kind.is_a(k))
    }

    /// Run `body` under this site's handlers.
    ///
    /// - `Ok(Outcome::Completed(v))` when the body succeeds
    /// - `Ok(Outcome::Handled { .. })` when a handler resolves the failure
    /// - `Err(signal)` with the original signal when a handler re-raises it
    ///   or no handler matches
    #[must_use = "a re-raised failure must be inspected"]
    pub fn run<T>(&mut self, body: impl FnOnce() -> Fallible<T>) -> Fallible<Outcome<T>> {
        match body() {
            Ok(value) => Ok(Outcome::Completed(value)),
            Err(signal) => self.dispatch(signal),
        }
    }

    /// Offer an already raised signal to this site.
    #[must_use = "a re-raised failure must be inspected"]
    pub fn dispatch<T>(&mut self, signal: FailureSignal) -> Fallible<Outcome<T>> {
        let Some(handler) = self.handlers.iter_mut().find(|h| signal.is_a(h.kind)) else {
            tracing::trace!(scope = %self.scope, id = %signal.id(), "no matching handler");
            return Err(signal);
        };

        let (kind, id) = (signal.kind(), signal.id());
        tracing::trace!(scope = %self.scope, %id, %kind, handler = %handler.kind, "dispatch");
        if let Some(record) = &self.record {
            record.push(PropagationEvent::Observed {
                scope: self.scope.clone(),
                kind,
                id,
            });
        }

        match (handler.callback)(&signal) {
            Resolution::Handled => {
                if let Some(record) = &self.record {
                    record.push(PropagationEvent::Handled {
                        scope: self.scope.clone(),
                        id,
                    });
                }
                Ok(Outcome::Handled { kind, id })
            }
            Resolution::Rethrow => {
                if let Some(record) = &self.record {
                    record.push(PropagationEvent::Rethrown {
                        scope: self.scope.clone(),
                        id,
                    });
                }
                Err(signal)
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
