//! Self-diagnostics.
//!
//! [`self_check!`](crate::self_check) is the development-time half of a
//! precondition check. It is compiled only with `debug_assertions`; in
//! release builds neither the condition nor the message is evaluated.
//! A tripped check is logged and counted per thread, and with the
//! `strict-checks` feature it also panics.
//!
//! The runtime half is always a [`FailureSignal`](crate::failure::FailureSignal)
//! raised by the operation itself. A `self_check!` is never the only guard
//! on a precondition.

use std::cell::Cell;
use std::fmt;

thread_local! {
    static TRIPPED: Cell<u64> = const { Cell::new(0) };
}

/// Debug-only precondition diagnostic.
///
/// ```rust
/// use safeguard_core::self_check;
///
/// fn halve(v: i64) -> i64 {
///     self_check!(v % 2 == 0, "halve expects an even value, got {}", v);
///     v / 2
/// }
/// # assert_eq!(halve(4), 2);
/// ```
#[macro_export]
macro_rules! self_check {
    ($cond:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            if !($cond) {
                $crate::diagnostics::trip(::core::format_args!($($arg)+));
            }
        }
    };
}

/// Record a tripped self-check. Called by [`self_check!`](crate::self_check).
#[doc(hidden)]
#[cold]
pub fn trip(detail: fmt::Arguments<'_>) {
    TRIPPED.with(|c| c.set(c.get() + 1));
    tracing::warn!(%detail, "self-check tripped");

    #[cfg(feature = "strict-checks")]
    panic!("self-check tripped: {detail}");
}

/// Number of self-checks tripped on the current thread.
pub fn tripped() -> u64 {
    TRIPPED.with(Cell::get)
}

/// Reset the current thread's counter, returning the previous value.
pub fn reset() -> u64 {
    TRIPPED.with(|c| c.replace(0))
}

/// Whether `self_check!` is compiled into this build.
pub const fn enabled() -> bool {
    cfg!(debug_assertions)
}
