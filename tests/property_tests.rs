//! Property and fuzz-style tests for robustness of core data structures.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use hygrostat::control::humidity::actuation_for;
use hygrostat::protocol::{CommandReader, parse_command};
use hygrostat::retry::{RETRIES_MAX, retry, retry_n};
use hygrostat::ui::input::{FAN_SPEED_FIELD, HUMIDITY_FIELD, InputBuffer};
use proptest::prelude::*;

/// One keypad action against the input editor.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Digit(u8),
    Dot,
    Delete,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u8..=9).prop_map(Edit::Digit),
        Just(Edit::Dot),
        Just(Edit::Delete),
    ]
}

// ── Input editor ──────────────────────────────────────────────

proptest! {
    /// Whatever is typed, the character count stays consistent and within
    /// the field, and the echo matches the count.
    #[test]
    fn input_counts_stay_consistent(
        edits in proptest::collection::vec(edit_strategy(), 0..40),
        humidity in any::<bool>(),
    ) {
        let field = if humidity { HUMIDITY_FIELD } else { FAN_SPEED_FIELD };
        let mut input = InputBuffer::new();
        for edit in edits {
            match edit {
                Edit::Digit(d) => { input.push_digit(d, field); }
                Edit::Dot => { input.push_dot(field); }
                Edit::Delete => { input.delete(); }
            }
            prop_assert_eq!(
                input.total_chars(),
                input.int_chars() + input.decimal_chars() + u8::from(input.decimal_used())
            );
            prop_assert!(input.total_chars() <= field.max_chars);
            prop_assert!(input.decimal_chars() <= field.max_decimals);
            prop_assert_eq!(input.text().len(), input.total_chars() as usize);
        }
    }

    /// The parsed value always equals the typed text read as a number.
    #[test]
    fn input_value_matches_text(
        edits in proptest::collection::vec(edit_strategy(), 1..20),
    ) {
        let mut input = InputBuffer::new();
        for edit in edits {
            match edit {
                Edit::Digit(d) => { input.push_digit(d, HUMIDITY_FIELD); }
                Edit::Dot => { input.push_dot(HUMIDITY_FIELD); }
                Edit::Delete => { input.delete(); }
            }
        }
        if !input.is_empty() {
            let text = input.text();
            let parsed: f32 = text.trim_end_matches('.').parse().unwrap();
            prop_assert!((parsed - input.value()).abs() < 1e-3, "{} vs {}", text, input.value());
        }
    }

    /// Deleting everything always returns to an empty entry.
    #[test]
    fn delete_drains_to_empty(
        edits in proptest::collection::vec(edit_strategy(), 0..20),
    ) {
        let mut input = InputBuffer::new();
        for edit in edits {
            match edit {
                Edit::Digit(d) => { input.push_digit(d, HUMIDITY_FIELD); }
                Edit::Dot => { input.push_dot(HUMIDITY_FIELD); }
                Edit::Delete => { input.delete(); }
            }
        }
        for _ in 0..HUMIDITY_FIELD.max_chars {
            input.delete();
        }
        prop_assert!(input.is_empty());
        prop_assert_eq!(input.value(), 0.0);
        prop_assert!(!input.delete());
    }
}

// ── Retry ─────────────────────────────────────────────────────

proptest! {
    /// An operation that fails `k` times is attempted `min(k + 1, MAX)`
    /// times and succeeds exactly when `k < MAX`.
    #[test]
    fn retry_attempt_count(failures in 0u8..30) {
        let mut calls = 0u8;
        let result = retry(|| {
            calls += 1;
            if calls <= failures { Err(calls) } else { Ok(calls) }
        });
        prop_assert_eq!(calls, (failures + 1).min(RETRIES_MAX));
        prop_assert_eq!(result.is_ok(), failures < RETRIES_MAX);
    }

    #[test]
    fn retry_n_never_exceeds_ceiling(ceiling in 0u8..20) {
        let mut calls = 0u8;
        let result: Result<(), ()> = retry_n(ceiling, || {
            calls += 1;
            Err(())
        });
        prop_assert!(result.is_err());
        prop_assert_eq!(calls, ceiling.max(1));
    }
}

// ── Actuation mapping ─────────────────────────────────────────

proptest! {
    /// Never both valves; pump off exactly inside the dead-band; duty
    /// saturates at or beyond `duty_max`.
    #[test]
    fn actuation_is_well_formed(
        output in -255.0f32..=255.0,
        duty_min in 0u8..=120,
        span in 1u8..=135,
    ) {
        let duty_max = duty_min + span;
        let a = actuation_for(output, duty_min, duty_max);
        prop_assert!(!(a.wet_open && a.dry_open));

        let magnitude = output.abs();
        if magnitude < f32::from(duty_min) {
            prop_assert_eq!(a.pump_duty, 0);
            prop_assert!(!a.wet_open && !a.dry_open);
        } else if magnitude >= f32::from(duty_max) {
            prop_assert_eq!(a.pump_duty, u8::MAX);
        } else {
            prop_assert!(a.pump_duty >= duty_min && a.pump_duty < duty_max);
        }
        if a.pump_duty > 0 {
            prop_assert_eq!(a.wet_open, output > 0.0);
            prop_assert_eq!(a.dry_open, output < 0.0);
        }
    }
}

// ── Host protocol ─────────────────────────────────────────────

proptest! {
    /// Arbitrary bytes never panic the reader, and well-formed commands
    /// after the garbage are still recognised.
    #[test]
    fn reader_survives_garbage(garbage in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = CommandReader::new();
        reader.feed(&garbage, |_| {});
        // A newline resynchronises.
        reader.feed(b"\n", |_| {});

        let mut commands = Vec::new();
        reader.feed(b"^d@\n", |r| commands.push(r));
        prop_assert_eq!(commands.len(), 1);
        prop_assert!(commands[0].is_ok());
    }

    #[test]
    fn parse_command_never_panics(line in ".{0,64}") {
        let _ = parse_command(&line);
    }
}
