//! Bounded retry of fallible device operations.
//!
//! Bus devices on the chamber board occasionally drop a transaction
//! (long cable runs, SMBus fan controller sharing the bus with plain I2C
//! parts).  Every device call made by the core goes through [`retry`],
//! which re-issues the operation back-to-back until it succeeds or the
//! attempt ceiling is reached.  There is no delay between attempts.
//!
//! Retried attempts repeat whatever side effects the operation performs;
//! callers only wrap operations the device treats as idempotent.

use log::debug;

/// Attempt ceiling for every device operation.
pub const RETRIES_MAX: u8 = 10;

/// Run `op` until it succeeds, at most [`RETRIES_MAX`] times.
///
/// Returns the first success, or the error of the final attempt.
pub fn retry<T, E>(op: impl FnMut() -> Result<T, E>) -> Result<T, E> {
    retry_n(RETRIES_MAX, op)
}

/// One-argument form of [`retry`]: `op` receives a copy of `arg` on every
/// attempt.
pub fn retry_with<A: Copy, T, E>(arg: A, mut op: impl FnMut(A) -> Result<T, E>) -> Result<T, E> {
    retry(|| op(arg))
}

/// [`retry`] with an explicit ceiling.  A ceiling of zero is treated as one
/// attempt.
pub fn retry_n<T, E>(attempts: u8, mut op: impl FnMut() -> Result<T, E>) -> Result<T, E> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => {
                debug!("retry: giving up after {} attempts", attempt);
                return Err(e);
            }
            Err(_) => attempt += 1,
        }
    }
}
