//! Two-valued failure contracts and the violation hook.
//!
//! An operation either promises never to fail ([`Contract::NoFail`]) or
//! may raise an unspecified [`FailureSignal`] ([`Contract::MayFail`]).
//! There is no enumerated list of permitted kinds.
//!
//! When a `NoFail` operation raises anyway, the process-wide violation hook
//! decides what the caller sees. Hooks are installed explicitly with
//! [`install_violation_hook`]; the most recent installation is active.
//! Each returned [`HookGuard`] removes exactly its own hook when dropped,
//! whatever order the guards go in, so no hook outlives its guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::failure::{Fallible, FailureKind, FailureSignal};

/// Declared failure behaviour of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contract {
    /// The operation never raises.
    NoFail,
    /// The operation may raise any failure signal.
    MayFail,
}

/// A `NoFail` operation that raised.
#[derive(Debug)]
pub struct ContractBreach<'a> {
    pub operation: &'a str,
    pub signal: &'a FailureSignal,
}

/// Hook verdict on a breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Re-raise the original signal unchanged.
    Propagate,
    /// Raise a `ContractViolation` describing the breach instead.
    Translate,
}

type ViolationHook = Arc<dyn Fn(&ContractBreach<'_>) -> HookDecision + Send + Sync>;

/// Installed hooks tagged with their installation number; the last is active.
static HOOKS: RwLock<Vec<(u64, ViolationHook)>> = RwLock::new(Vec::new());
static INSTALLS: AtomicU64 = AtomicU64::new(0);
static VIOLATIONS: AtomicU64 = AtomicU64::new(0);

/// Uninstalls its hook on drop.
#[must_use = "dropping the guard immediately uninstalls the hook"]
pub struct HookGuard {
    installation: u64,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        let mut hooks = HOOKS.write();
        let was_active = hooks.last().is_some_and(|(n, _)| *n == self.installation);
        hooks.retain(|(n, _)| *n != self.installation);
        tracing::debug!(
            installation = self.installation,
            was_active,
            remaining = hooks.len(),
            "violation hook removed"
        );
    }
}

/// Install `hook` as the active process-wide violation hook.
pub fn install_violation_hook(
    hook: impl Fn(&ContractBreach<'_>) -> HookDecision + Send + Sync + 'static,
) -> HookGuard {
    let installation = INSTALLS.fetch_add(1, Ordering::Relaxed);
    let mut hooks = HOOKS.write();
    hooks.push((installation, Arc::new(hook)));
    tracing::debug!(installation, stacked = hooks.len(), "violation hook installed");
    HookGuard { installation }
}

pub fn violation_hook_installed() -> bool {
    !HOOKS.read().is_empty()
}

/// Breaches observed since process start.
pub fn violation_count() -> u64 {
    VIOLATIONS.load(Ordering::Relaxed)
}

/// Run `body` under its declared contract.
///
/// `MayFail` failures pass through untouched. A `NoFail` failure is handed
/// to the violation hook; with no hook installed it is translated into a
/// `ContractViolation`.
#[must_use = "a contract failure must be inspected"]
pub fn call_with_contract<T>(
    operation: &str,
    contract: Contract,
    body: impl FnOnce() -> Fallible<T>,
) -> Fallible<T> {
    match (body(), contract) {
        (Ok(value), _) => Ok(value),
        (Err(signal), Contract::MayFail) => Err(signal),
        (Err(signal), Contract::NoFail) => Err(breach(operation, signal)),
    }
}

fn breach(operation: &str, signal: FailureSignal) -> FailureSignal {
    VIOLATIONS.fetch_add(1, Ordering::Relaxed);
    tracing::error!(operation, id = %signal.id(), kind = %signal.kind(), "no-fail contract breached");

    // Clone the Arc so the hook runs without holding the lock.
    let hook = HOOKS.read().last().map(|(_, hook)| Arc::clone(hook));
    let decision = hook.map_or(HookDecision::Translate, |hook| {
        hook(&ContractBreach {
            operation,
            signal: &signal,
        })
    });

    match decision {
        HookDecision::Propagate => signal,
        HookDecision::Translate => FailureSignal::raise(
            FailureKind::ContractViolation,
            format!("{operation} is declared no-fail but raised {signal}"),
        ),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
