//! Local recovery.
//!
//! A failure is recovered where it is raised only when the state can be made
//! valid again and a retry is productive: clamping an out-of-range input,
//! or releasing a held memory margin before retrying an allocation.
//! Everything else is re-raised unchanged, and [`action::recommend`] tells
//! the outermost layer what to offer the user.

pub mod action;
pub mod arena;
pub mod retry;

pub use action::{RecoveryAction, recommend};
pub use arena::{Arena, ArenaId, ArenaStats, BlockId, MemoryReserve, allocate_with_reserve};
pub use retry::{RecoveryPolicy, to_char_clamped};
