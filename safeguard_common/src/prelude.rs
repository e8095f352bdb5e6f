//! Prelude module for common re-exports.
//!
//! ```rust
//! use safeguard_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::{LogFormat, LogLevel};
pub use crate::logging::{init_from_config, init_test_tracing, init_tracing};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, Validate};

// ─── Domain Constants ───────────────────────────────────────────────
pub use crate::consts::{
    BYTE_MAX, BYTE_MIN, DEFAULT_ARENA_CAPACITY, DEFAULT_JOURNAL_CAPACITY, DEFAULT_RESERVE_BYTES,
};
