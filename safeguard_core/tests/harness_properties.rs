//! # Harness Property Tests
//!
//! Domain-wide checks driven through the verification harness:
//!
//! - Every byte value converts to itself
//! - Out-of-range values fail and leave auxiliary state untouched
//! - Substring past the end is a logic failure
//! - Unreachable handler declarations are refused at setup
//! - Journal finalize failures keep the journal intact

#![cfg(not(feature = "strict-checks"))]
#![deny(unused_must_use)]

use safeguard_common::consts::{BYTE_MAX, BYTE_MIN};
use safeguard_core::handler::check_reachable;
use safeguard_core::ops::{to_char_into, to_char_safe};
use safeguard_core::prelude::*;
use safeguard_core::recovery::{Arena, MemoryReserve, allocate_with_reserve};

#[test]
fn every_byte_converts_to_itself() {
    let mut harness = Harness::new("byte domain");
    for value in BYTE_MIN..=BYTE_MAX {
        let expected = u8::try_from(value).expect("byte domain");
        harness.check(&value.to_string(), to_char_safe(value), Expectation::Value(expected));
    }
    let report = harness.finish().expect("all bytes convert");
    assert_eq!(report.passed(), 256);
}

#[test]
fn out_of_range_fails_without_touching_buffer() {
    let mut harness = Harness::new("outside byte domain");
    let mut buffer = b"ok".to_vec();
    for value in [-1, 256, i64::MIN, i64::MAX, -129, 1_000] {
        let before = buffer.clone();
        let tracked = harness.track("into", to_char_into(value, &mut buffer));
        harness.check_tracked(
            &format!("into {value}"),
            tracked,
            Expectation::Fails(FailureKind::OutOfRange),
        );
        harness.record(&format!("buffer after {value}"), buffer == before, None);
    }
    let report = harness.finish().expect("buffer untouched");
    assert_eq!(report.total(), 12);
    assert_eq!(buffer, b"ok");
}

#[test]
fn substring_past_end_is_logic_failure() {
    let mut harness = Harness::new("substring");
    harness.check(
        "abc from 10",
        safeguard_core::ops::substring_safe("abc", 10),
        Expectation::Fails(FailureKind::Logic),
    );
    harness.check(
        "abc from 3",
        safeguard_core::ops::substring_safe("abc", 3),
        Expectation::Value(""),
    );
    harness.finish().expect("substring cases");
}

#[test]
fn ancestor_before_descendant_refused() {
    let err = check_reachable([FailureKind::Runtime, FailureKind::Overflow]).unwrap_err();
    assert_eq!(
        err,
        SetupError::UnreachableHandler {
            shadowed: FailureKind::Overflow,
            by: FailureKind::Runtime,
            position: 1,
        }
    );
    assert!(check_reachable([FailureKind::Overflow, FailureKind::Runtime, FailureKind::Any]).is_ok());
    assert!(check_reachable([FailureKind::Any, FailureKind::Type]).is_err());
}

#[test]
fn journal_finalize_failure_keeps_entries() {
    let mut journal = Journal::new(2);
    let mut writer = journal.writer();
    writer.stage("first");
    assert_eq!(writer.finalize().unwrap(), 1);

    let mut writer = journal.writer();
    writer.stage("second");
    writer.stage("third");
    let err = writer.finalize().unwrap_err();
    assert!(err.is_a(FailureKind::Runtime));
    assert_eq!(journal.entries(), ["first"]);
}

#[test]
fn reserve_fallback_is_all_or_nothing() {
    let mut arena = Arena::new(128);
    let mut reserve = MemoryReserve::acquire(&mut arena, 32).unwrap();
    let _bulk = arena.allocate(80).unwrap();
    let before = arena.stats();

    let err = allocate_with_reserve(&mut arena, &mut reserve, 64).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Allocation);
    assert_eq!(arena.stats(), before);
    assert!(reserve.is_held());

    let id = allocate_with_reserve(&mut arena, &mut reserve, 40).unwrap();
    assert_eq!(arena.block(id).map(<[u8]>::len), Some(40));
    assert!(!reserve.is_held());
}

#[test]
fn discarded_result_fails_the_run() {
    let mut harness = Harness::new("ledger");
    harness.check("fine", to_char_safe(9), Expectation::Value(9));
    drop(harness.track("ignored", to_char_safe(700)));
    match harness.finish() {
        Err(HarnessError::DiscardedResults { count, labels }) => {
            assert_eq!(count, 1);
            assert_eq!(labels, ["ignored"]);
        }
        other => panic!("expected discard failure, got {other:?}"),
    }
}
