//! # Safeguard Core
//!
//! Error-contract demonstrator. Every rule about raising, catching and
//! unwinding is expressed as an operation here and proven by a test.
//!
//! ## Building Blocks
//!
//! 1. **Taxonomy** ([`failure`]) - `FailureKind` hierarchy and the
//!    non-cloneable `FailureSignal`
//! 2. **Operations** ([`ops`]) - fallible conversions with documented
//!    guarantees
//! 3. **Handler sites** ([`handler`]) - ordered handlers, unreachable ones
//!    rejected at setup
//! 4. **Scopes** ([`scope`]) - RAII releases and the outermost frame
//! 5. **Resources** ([`resource`]) - explicit, fallible finalize
//! 6. **Contracts** ([`contract`]) - `NoFail` / `MayFail` and the violation
//!    hook
//! 7. **Recovery** ([`recovery`]) - clamped retry, memory reserve,
//!    recommended actions
//! 8. **Harness** ([`harness`]) - expectation checks and the inspection
//!    ledger
//!
//! ## Propagation
//!
//! A failure travels outward by `?`. Each frame it leaves drops its guards
//! in reverse acquisition order, so by the time a handler sees the signal
//! every inner release has happened. A failure nobody handles ends in
//! [`scope::run_to_completion`] as a returned `Termination`, never as a
//! process exit.

#![deny(unused_must_use)]

pub mod contract;
pub mod diagnostics;
pub mod failure;
pub mod handler;
pub mod harness;
pub mod ops;
pub mod prelude;
pub mod recovery;
pub mod resource;
pub mod scope;
pub mod settings;
