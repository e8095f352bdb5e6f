//! Common imports for demonstrator code and tests.
//!
//! ```rust
//! use safeguard_core::prelude::*;
//!
//! let signal = FailureSignal::out_of_range("index 9");
//! assert!(signal.is_a(FailureKind::Logic));
//! ```

pub use crate::contract::{Contract, HookDecision, call_with_contract, install_violation_hook};
pub use crate::failure::{Fallible, FailureKind, FailureSignal, SignalId};
pub use crate::handler::{CatchSite, Outcome, Resolution, SetupError};
pub use crate::harness::{Expectation, Harness, HarnessError, Tracked};
pub use crate::resource::{Finalize, Journal};
pub use crate::scope::{PropagationEvent, PropagationRecord, Termination, run_to_completion};
pub use crate::self_check;
