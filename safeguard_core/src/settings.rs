//! Demonstrator configuration.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "safeguard-demo"
//!
//! [recovery]
//! clamp_out_of_range = true
//! arena_capacity = 65536
//! reserve_bytes = 4096
//!
//! [journal]
//! capacity = 256
//! ```
//!
//! Every section except `[shared]` is optional and falls back to the
//! workspace defaults.

use serde::{Deserialize, Serialize};

use safeguard_common::config::{ConfigError, SharedConfig, Validate};
use safeguard_common::consts::{
    DEFAULT_ARENA_CAPACITY, DEFAULT_JOURNAL_CAPACITY, DEFAULT_RESERVE_BYTES,
};

use crate::failure::Fallible;
use crate::recovery::{Arena, MemoryReserve, RecoveryPolicy};
use crate::resource::Journal;

/// Local recovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoverySettings {
    /// Clamp out-of-range conversions instead of re-raising.
    pub clamp_out_of_range: bool,
    /// Byte budget of the arena.
    pub arena_capacity: usize,
    /// Margin held back for emergency release.
    pub reserve_bytes: usize,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            clamp_out_of_range: false,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            reserve_bytes: DEFAULT_RESERVE_BYTES,
        }
    }
}

impl RecoverySettings {
    pub fn policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            clamp_out_of_range: self.clamp_out_of_range,
        }
    }

    /// Build the arena with its reserve already taken.
    pub fn build_arena(&self) -> Fallible<(Arena, MemoryReserve)> {
        let mut arena = Arena::new(self.arena_capacity);
        let reserve = MemoryReserve::acquire(&mut arena, self.reserve_bytes)?;
        Ok((arena, reserve))
    }
}

/// Journal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalSettings {
    pub capacity: usize,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

impl JournalSettings {
    pub fn build(&self) -> Journal {
        Journal::new(self.capacity)
    }
}

/// Complete demonstrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemonstratorConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub recovery: RecoverySettings,
    #[serde(default)]
    pub journal: JournalSettings,
}

impl Validate for DemonstratorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.recovery.arena_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "recovery.arena_capacity must be positive".to_string(),
            ));
        }
        if self.recovery.reserve_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "recovery.reserve_bytes must be positive".to_string(),
            ));
        }
        if self.recovery.reserve_bytes >= self.recovery.arena_capacity {
            return Err(ConfigError::ValidationError(format!(
                "recovery.reserve_bytes ({}) must be below arena_capacity ({})",
                self.recovery.reserve_bytes, self.recovery.arena_capacity
            )));
        }
        if self.journal.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "journal.capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
