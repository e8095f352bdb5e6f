//! Safeguard Common Library
//!
//! Shared constants, configuration loading and logging setup for the
//! safeguard workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Domain limits and defaults
//! - [`config`] - TOML configuration loading traits and types
//! - [`logging`] - `tracing` subscriber installation
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use safeguard_common::prelude::*;
//!
//! assert_eq!(BYTE_MAX, 255);
//! assert_eq!(LogLevel::default(), LogLevel::Info);
//! ```

pub mod config;
pub mod consts;
pub mod logging;
pub mod prelude;
