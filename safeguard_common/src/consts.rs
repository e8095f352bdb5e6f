//! Workspace-wide constants.
//!
//! Single source of truth for the value domains checked by the fallible
//! operations and the default budgets used by recovery and journaling.

use static_assertions::const_assert;

/// Smallest value representable as an unsigned byte.
pub const BYTE_MIN: i64 = 0;

/// Largest value representable as an unsigned byte.
pub const BYTE_MAX: i64 = 255;

/// Default byte budget of a recovery arena.
pub const DEFAULT_ARENA_CAPACITY: usize = 64 * 1024;

/// Default margin held back from the arena for emergency release.
pub const DEFAULT_RESERVE_BYTES: usize = 4 * 1024;

/// Default number of entries a journal accepts before it overflows.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "safeguard.toml";

// The byte domain must match `u8` exactly.
const_assert!(BYTE_MIN == u8::MIN as i64);
const_assert!(BYTE_MAX == u8::MAX as i64);
// A reserve larger than the arena could never be handed back.
const_assert!(DEFAULT_RESERVE_BYTES < DEFAULT_ARENA_CAPACITY);
const_assert!(DEFAULT_JOURNAL_CAPACITY > 0);
