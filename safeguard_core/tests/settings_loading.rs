//! Demonstrator settings loaded from disk and turned into runtime objects.

#![deny(unused_must_use)]

use safeguard_common::config::{ConfigError, ConfigLoader, LogLevel, Validate};
use safeguard_common::consts::DEFAULT_CONFIG_FILE;
use safeguard_core::recovery::allocate_with_reserve;
use safeguard_core::resource::Finalize;
use safeguard_core::settings::DemonstratorConfig;
use std::fs;
use tempfile::TempDir;

const FULL: &str = r#"
[shared]
log_level = "debug"
service_name = "safeguard-demo"

[recovery]
clamp_out_of_range = true
arena_capacity = 256
reserve_bytes = 64

[journal]
capacity = 2
"#;

#[test]
fn full_file_drives_runtime_objects() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, FULL).unwrap();

    let config = DemonstratorConfig::load_validated(&path).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);

    let (mut arena, mut reserve) = config.recovery.build_arena().unwrap();
    assert_eq!(arena.available(), 192);
    let _bulk = arena.allocate(180).unwrap();
    allocate_with_reserve(&mut arena, &mut reserve, 40).unwrap();
    assert!(!reserve.is_held());

    let mut journal = config.journal.build();
    let mut writer = journal.writer();
    writer.stage("a");
    writer.stage("b");
    writer.stage("c");
    assert!(writer.finalize().is_err());
    assert!(journal.is_empty());
}

#[cfg(not(feature = "strict-checks"))]
#[test]
fn clamp_policy_follows_config() {
    let on = DemonstratorConfig::from_toml_str(FULL).unwrap();
    assert_eq!(on.recovery.policy().to_char(-5).unwrap(), 0);

    let off = DemonstratorConfig::default();
    assert!(off.recovery.policy().to_char(-5).is_err());
}

#[test]
fn oversized_reserve_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        "[shared]\nservice_name = \"x\"\n[recovery]\narena_capacity = 8\nreserve_bytes = 16\n",
    )
    .unwrap();

    assert!(DemonstratorConfig::load(&path).is_ok());
    assert!(matches!(
        DemonstratorConfig::load_validated(&path),
        Err(ConfigError::ValidationError(msg)) if msg.contains("arena_capacity")
    ));
}

#[test]
fn zero_journal_capacity_rejected() {
    let config = DemonstratorConfig::from_toml_str(
        "[shared]\nservice_name = \"x\"\n[journal]\ncapacity = 0\n",
    )
    .unwrap();
    assert!(config.validate().is_err());
}
