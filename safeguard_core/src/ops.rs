//! Range-checked operations.
//!
//! Each operation documents its valid input domain and raises a
//! [`FailureSignal`] for anything outside it. None of them report failure
//! through sentinel values, and none of them touch shared state before the
//! input has been validated.
//!
//! | Operation              | Failure kinds                    |
//! |------------------------|----------------------------------|
//! | [`to_char_safe`]       | `OutOfRange`                     |
//! | [`to_char_into`]       | `OutOfRange` (buffer unchanged)  |
//! | [`substring_safe`]     | `OutOfRange`                     |
//! | [`substring_range_safe`] | `OutOfRange`                   |
//! | [`checked_sum`]        | `Overflow`, `Underflow`          |
//! | [`narrow_to_i32`]      | `Range`                          |
//! | [`sqrt_safe`]          | `Domain`                         |
//! | [`repeat_safe`]        | `InvalidArgument`, `Length`      |
//! | [`downcast_safe`]      | `Type`                           |

use std::any::Any;

use safeguard_common::consts::{BYTE_MAX, BYTE_MIN};

use crate::failure::{Fallible, FailureSignal};
use crate::self_check;

/// Convert an integer to a byte.
///
/// Succeeds iff `0 <= value <= 255`.
#[must_use = "a conversion failure must be inspected"]
pub fn to_char_safe(value: i64) -> Fallible<u8> {
    self_check!(
        (BYTE_MIN..=BYTE_MAX).contains(&value),
        "to_char_safe: {} outside [{}, {}]",
        value,
        BYTE_MIN,
        BYTE_MAX
    );

    u8::try_from(value).map_err(|_| {
        FailureSignal::out_of_range(format!(
            "value {value} outside [{BYTE_MIN}, {BYTE_MAX}]"
        ))
    })
}

/// Convert `value` and append it to `out`.
///
/// On failure `out` is left exactly as it was.
#[must_use = "a conversion failure must be inspected"]
pub fn to_char_into(value: i64, out: &mut Vec<u8>) -> Fallible<()> {
    let byte = to_char_safe(value)?;
    out.try_reserve(1)
        .map_err(|e| FailureSignal::allocation(format!("cannot grow buffer: {e}")))?;
    out.push(byte);
    Ok(())
}

/// Suffix of `s` starting at character `start`.
///
/// `start == chars(s)` yields `""`; anything past the end is `OutOfRange`
/// rather than a silently truncated or empty result.
#[must_use = "a substring failure must be inspected"]
pub fn substring_safe(s: &str, start: usize) -> Fallible<&str> {
    let offset = char_offset(s, start)?;
    Ok(&s[offset..])
}

/// Up to `count` characters of `s` starting at character `start`.
///
/// `count` is clamped to what remains; only `start` is checked.
#[must_use = "a substring failure must be inspected"]
pub fn substring_range_safe(s: &str, start: usize, count: usize) -> Fallible<&str> {
    let begin = char_offset(s, start)?;
    let rest = &s[begin..];
    let end = rest
        .char_indices()
        .nth(count)
        .map_or(rest.len(), |(i, _)| i);
    Ok(&rest[..end])
}

fn char_offset(s: &str, start: usize) -> Fallible<usize> {
    let len = s.chars().count();
    if start > len {
        return Err(FailureSignal::out_of_range(format!(
            "start {start} past end of {len}-character string"
        )));
    }
    Ok(s.char_indices().nth(start).map_or(s.len(), |(i, _)| i))
}

/// Sum of `values` without wrapping.
#[must_use = "an arithmetic failure must be inspected"]
pub fn checked_sum(values: &[i64]) -> Fallible<i64> {
    values.iter().try_fold(0i64, |acc, &v| {
        acc.checked_add(v).ok_or_else(|| {
            if v > 0 {
                FailureSignal::overflow(format!("{acc} + {v} exceeds i64::MAX"))
            } else {
                FailureSignal::underflow(format!("{acc} + {v} below i64::MIN"))
            }
        })
    })
}

/// Narrow a 64-bit value to 32 bits.
#[must_use = "a narrowing failure must be inspected"]
pub fn narrow_to_i32(value: i64) -> Fallible<i32> {
    i32::try_from(value)
        .map_err(|_| FailureSignal::range(format!("{value} not representable as i32")))
}

/// Square root of a non-negative, non-NaN value.
#[must_use = "a domain failure must be inspected"]
pub fn sqrt_safe(value: f64) -> Fallible<f64> {
    if value.is_nan() || value < 0.0 {
        return Err(FailureSignal::domain(format!(
            "sqrt undefined for {value}"
        )));
    }
    Ok(value.sqrt())
}

/// `s` repeated `times` times, refusing results longer than `max_len` bytes.
#[must_use = "a length failure must be inspected"]
pub fn repeat_safe(s: &str, times: usize, max_len: usize) -> Fallible<String> {
    if max_len == 0 {
        return Err(FailureSignal::invalid_argument("max_len must be positive"));
    }
    let total = s
        .len()
        .checked_mul(times)
        .filter(|&n| n <= max_len)
        .ok_or_else(|| {
            FailureSignal::length(format!(
                "{} x {times} bytes exceeds limit of {max_len}",
                s.len()
            ))
        })?;

    let mut out = String::new();
    out.try_reserve_exact(total)
        .map_err(|e| FailureSignal::allocation(format!("cannot reserve {total} bytes: {e}")))?;
    for _ in 0..times {
        out.push_str(s);
    }
    Ok(out)
}

/// Borrow `value` as a `T`.
#[must_use = "a type failure must be inspected"]
pub fn downcast_safe<T: Any>(value: &dyn Any) -> Fallible<&T> {
    value.downcast_ref::<T>().ok_or_else(|| {
        FailureSignal::type_mismatch(format!(
            "value is not a {}",
            std::any::type_name::<T>()
        ))
    })
}

// ─── Tests ──────────────────────────────────────────────────────────
