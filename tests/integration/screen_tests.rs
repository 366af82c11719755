//! Keypad-driven menu: page flow, target entry, hold-to-stop, calibration.

use crate::mock_hw::Bench;

use hygrostat::app::commands::KeyEvent;
use hygrostat::app::events::{AppEvent, ControlLoop};
use hygrostat::app::ports::{CalibrationPoint, CalibrationPointId};
use hygrostat::config::SystemConfig;
use hygrostat::ui::PageId;

/// Boot, let the readings page draw, and take the first reading.
fn booted() -> Bench {
    let mut bench = Bench::new();
    bench.advance(330);
    bench
}

// ── Readings page ─────────────────────────────────────────────

#[test]
fn readings_page_layout() {
    let bench = booted();
    assert_eq!(bench.chamber.page(), PageId::Readings);
    assert!(bench.hw.row(0).contains("Readings"));
    assert_eq!(bench.hw.row(1), "--------------------");
    assert!(bench.hw.row(2).starts_with("IDLE"));
    assert!(bench.hw.row(2).contains("RH:"));
    assert!(bench.hw.row(3).contains("RPM"));
}

#[test]
fn temperature_row_when_enabled() {
    let mut config = SystemConfig::default();
    config.show_temperature = true;
    let mut bench = Bench::with_config(config);
    bench.advance(330);
    assert!(bench.hw.row(1).contains("T:"));
    assert!(bench.hw.row(1).contains("23.0"), "row 1: {:?}", bench.hw.row(1));
}

#[test]
fn running_indicator_moves() {
    let mut bench = booted();
    bench.tap('h');
    bench.advance(500);
    let first = bench.hw.row(2)[..4].to_owned();
    bench.advance(500);
    let second = bench.hw.row(2)[..4].to_owned();
    assert_ne!(first, "IDLE");
    assert_ne!(first, second);
    assert!(bench.hw.row(3).starts_with("IDLE"));
}

// ── Hold to stop ──────────────────────────────────────────────

#[test]
fn hold_counts_down_then_stops_loop() {
    let mut bench = booted();
    bench.tap('h');
    assert!(bench.chamber.context().humidity.state.active);

    bench.key(KeyEvent::pressed('h'));
    bench.key(KeyEvent::hold('h'));
    assert_eq!(bench.chamber.page(), PageId::Hold);
    bench.advance(10);
    assert!(bench.hw.shows("Hold button for"));
    assert!(bench.hw.row(2).contains('3'), "row 2: {:?}", bench.hw.row(2));

    bench.advance(1000);
    assert!(bench.hw.row(2).contains('2'));

    bench.advance(2000);
    assert_eq!(bench.chamber.page(), PageId::Readings);
    assert!(!bench.chamber.context().humidity.state.active);
    assert!(bench.sink.contains(&AppEvent::ControlStopped(ControlLoop::Humidity)));

    // The release that ends the hold must not restart the loop.
    bench.key(KeyEvent::released('h'));
    assert!(!bench.chamber.context().humidity.state.active);

    // The next tap does.
    bench.tap('h');
    assert!(bench.chamber.context().humidity.state.active);
}

#[test]
fn early_release_aborts_hold() {
    let mut bench = booted();
    bench.tap('f');
    bench.key(KeyEvent::pressed('f'));
    bench.key(KeyEvent::hold('f'));
    bench.advance(1500);
    bench.key(KeyEvent::released('f'));
    assert_eq!(bench.chamber.page(), PageId::Readings);
    assert!(bench.chamber.context().fan.state.active);
    assert!(bench.hw.fan_enabled);
}

#[test]
fn hold_stops_fan_with_zero_setpoint() {
    let mut bench = booted();
    bench.tap('f');
    bench.key(KeyEvent::pressed('f'));
    bench.key(KeyEvent::hold('f'));
    bench.advance(3100);
    assert_eq!(bench.hw.fan_targets.last(), Some(&0.0));
    assert!(!bench.hw.fan_enabled);
    assert!(!bench.hw.led_fan);
}

#[test]
fn hold_on_idle_loop_does_nothing() {
    let mut bench = booted();
    bench.key(KeyEvent::pressed('h'));
    bench.key(KeyEvent::hold('h'));
    assert_eq!(bench.chamber.page(), PageId::Readings);
}

// ── Target entry ──────────────────────────────────────────────

#[test]
fn menu_cycles_through_adjust_pages() {
    let mut bench = booted();
    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::HumidityAdjust);
    assert!(bench.hw.shows("Relative humidity(%)"));
    assert!(bench.hw.row(2).ends_with("52.5"));

    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::FanSpeedAdjust);
    assert!(bench.hw.row(2).ends_with("9800"));

    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::Calibration);
    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::Readings);
}

#[test]
fn humidity_target_commit() {
    let mut bench = booted();
    bench.tap('s');
    bench.type_keys("60.5");
    assert!(bench.hw.row(3).ends_with("60.5"), "row 3: {:?}", bench.hw.row(3));
    bench.tap('s');

    assert_eq!(bench.chamber.page(), PageId::FanSpeedAdjust);
    assert_eq!(bench.chamber.context().humidity.state.target, 60.5);
    assert!(bench.sink.contains(&AppEvent::TargetChanged {
        control: ControlLoop::Humidity,
        value: 60.5
    }));
}

#[test]
fn entry_echo_tracks_deletes() {
    let mut bench = booted();
    bench.tap('s');
    bench.type_keys("12.5");
    bench.tap('d');
    assert!(bench.hw.row(3).ends_with("  12."), "row 3: {:?}", bench.hw.row(3));
    bench.tap('d');
    assert!(bench.hw.row(3).ends_with("   12"), "row 3: {:?}", bench.hw.row(3));
}

#[test]
fn fan_target_commit_while_running_is_pushed() {
    let mut bench = booted();
    bench.tap('f');
    bench.tap('s');
    bench.tap('s');
    bench.type_keys("5000");
    bench.tap('s');

    assert_eq!(bench.chamber.page(), PageId::Calibration);
    assert_eq!(bench.hw.fan_targets.last(), Some(&5000.0));
}

#[test]
fn fan_target_commit_while_idle_waits_for_start() {
    let mut bench = booted();
    bench.tap('s');
    bench.tap('s');
    bench.type_keys("5000");
    bench.tap('s');
    assert!(bench.hw.fan_targets.is_empty());

    bench.tap('s');
    bench.tap('f');
    assert_eq!(bench.hw.fan_targets, vec![5000.0]);
}

#[test]
fn too_high_entry_flashes_maximum_then_returns() {
    let mut bench = booted();
    bench.tap('s');
    bench.type_keys("99");
    bench.tap('s');

    assert_eq!(bench.chamber.page(), PageId::MaxValError);
    assert!(bench.hw.shows("Maximum value is"));
    assert!(bench.hw.row(2).contains("95.0"), "row 2: {:?}", bench.hw.row(2));
    assert!(bench.hw.row(2).starts_with(">>>>>"));
    assert!(bench.sink.contains(&AppEvent::InputRejected {
        control: ControlLoop::Humidity,
        value: 99.0
    }));

    bench.advance(4300);
    assert_eq!(bench.chamber.page(), PageId::HumidityAdjust);
    assert_eq!(bench.chamber.context().humidity.state.target, 52.5);
    assert!(bench.chamber.context().input.is_empty());
}

#[test]
fn too_low_fan_entry_flashes_minimum() {
    let mut bench = booted();
    bench.tap('s');
    bench.tap('s');
    bench.type_keys("900");
    bench.tap('s');

    assert_eq!(bench.chamber.page(), PageId::MinValError);
    assert!(bench.hw.shows("Minimum value is"));
    assert!(bench.hw.row(2).contains("1500"));

    bench.advance(4300);
    assert_eq!(bench.chamber.page(), PageId::FanSpeedAdjust);
}

#[test]
fn range_limits_are_inclusive() {
    let mut bench = booted();
    bench.tap('s');
    bench.type_keys("95");
    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::FanSpeedAdjust);
    assert_eq!(bench.chamber.context().humidity.state.target, 95.0);
}

// ── Calibration ───────────────────────────────────────────────

fn to_calibration(bench: &mut Bench) {
    bench.tap('s');
    bench.tap('s');
    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::Calibration);
}

#[test]
fn calibration_point_is_saved_against_raw_reading() {
    let mut bench = booted();
    to_calibration(&mut bench);
    bench.tap('1');
    assert_eq!(bench.chamber.page(), PageId::CalibrationPoint);
    assert_eq!(bench.hw.row(0), "------Point 1-------");
    assert!(bench.hw.row(1).contains("N/A"));
    assert!(bench.hw.row(2).ends_with("45.0"));

    bench.type_keys("75.3");
    bench.tap('s');

    assert_eq!(bench.chamber.page(), PageId::Calibration);
    assert_eq!(
        bench.hw.calibration[0],
        Some(CalibrationPoint {
            reference: 75.3,
            raw: 45.0
        })
    );
    assert!(bench.sink.contains(&AppEvent::CalibrationSaved(CalibrationPointId::One)));
}

#[test]
fn saved_point_is_shown_on_reentry() {
    let mut bench = booted();
    bench.hw.calibration[1] = Some(CalibrationPoint {
        reference: 33.0,
        raw: 30.5,
    });
    to_calibration(&mut bench);
    bench.tap('2');
    assert!(bench.hw.row(1).contains("30.5"));
    assert!(bench.hw.row(1).ends_with("33.0"));
}

#[test]
fn empty_calibration_entry_saves_nothing() {
    let mut bench = booted();
    to_calibration(&mut bench);
    bench.tap('2');
    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::Calibration);
    assert_eq!(bench.hw.calibration, [None, None]);
}

#[test]
fn calibration_reset_requires_confirmation() {
    let mut bench = booted();
    bench.hw.calibration[0] = Some(CalibrationPoint {
        reference: 75.0,
        raw: 70.0,
    });
    to_calibration(&mut bench);
    bench.tap('3');
    assert_eq!(bench.chamber.page(), PageId::CalibrationReset);
    assert!(bench.hw.shows("Reset calibration?"));

    bench.tap('4');
    assert_eq!(bench.chamber.page(), PageId::CalibrationReset);
    bench.tap('5');
    assert_eq!(bench.chamber.page(), PageId::Calibration);
    assert_eq!(bench.hw.calibration, [None, None]);
    assert!(bench.sink.contains(&AppEvent::CalibrationCleared));
}

#[test]
fn calibration_reset_times_out() {
    let mut bench = booted();
    to_calibration(&mut bench);
    bench.tap('3');
    bench.advance(2100);
    assert_eq!(bench.chamber.page(), PageId::Calibration);
    assert!(!bench.sink.contains(&AppEvent::CalibrationCleared));
}
