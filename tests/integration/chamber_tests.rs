//! Chamber orchestration: init, acquisition, regulation, host streaming.
//!
//! Timeline with the default config (period 1000 ms, latency 315 ms):
//! `init` at t = 0 primes the sensor, the first fetch lands at t = 325,
//! then every 1000 ms after that.

use crate::mock_hw::Bench;

use hygrostat::app::commands::AppCommand;
use hygrostat::app::events::{AppEvent, ControlLoop, SensorKind};
use hygrostat::ui::PageId;

fn telemetry_count(bench: &Bench) -> usize {
    bench.sink.count(|e| matches!(e, AppEvent::Telemetry(_)))
}

// ── Init ──────────────────────────────────────────────────────

#[test]
fn init_configures_fan_controller_and_primes_sensor() {
    let bench = Bench::new();
    let setup = bench.hw.fan_setup.expect("fan controller configured");
    assert_eq!(setup.abs_min_rpm, 1000.0);
    assert_eq!(setup.spin_up_drive_percent, 30);
    assert_eq!(bench.hw.triggers, 1);
    assert!(bench.sink.contains(&AppEvent::Started));
}

#[test]
fn init_leaves_actuators_off_and_draws_splash() {
    let bench = Bench::new();
    assert_eq!(bench.hw.pump_duty, 0);
    assert!(!bench.hw.fan_enabled);
    assert!(!bench.hw.valve_wet && !bench.hw.valve_dry);
    assert!(bench.hw.shows("HYGROSTAT"), "splash missing:\n{}", bench.hw.screen());
    assert_eq!(bench.hw.row(0), "********************");
}

// ── Acquisition ───────────────────────────────────────────────

#[test]
fn first_fetch_follows_prime() {
    let mut bench = Bench::new();
    bench.advance(320);
    assert_eq!(telemetry_count(&bench), 0);

    bench.advance(10);
    assert_eq!(telemetry_count(&bench), 1);
    assert!(bench.hw.row(2).contains("45.0"), "row 2: {:?}", bench.hw.row(2));
}

#[test]
fn fetches_repeat_every_period() {
    let mut bench = Bench::new();
    bench.advance(330);
    bench.advance(3000);
    assert_eq!(telemetry_count(&bench), 4);
    // One trigger from init, one per later period.
    assert_eq!(bench.hw.triggers, 4);
}

// ── Humidity regulation ───────────────────────────────────────

#[test]
fn humidity_loop_humidifies_below_target() {
    let mut bench = Bench::new();
    bench.hw.humidity = 20.0;
    bench.advance(10);
    bench.tap('h');
    assert!(bench.chamber.context().humidity.state.active);
    assert!(bench.hw.led_humidity);

    // The fetch at 325 ms is the only fresh reading so far.
    bench.advance(700);
    assert!(bench.chamber.context().acquisition.humidity.is_ok());
    assert!(bench.hw.pump_duty > 0);
    assert!(bench.hw.valve_wet);
    assert!(!bench.hw.valve_dry);
}

#[test]
fn humidity_failure_shuts_actuators_and_recovers() {
    let mut bench = Bench::new();
    bench.hw.humidity = 20.0;
    bench.advance(10);
    bench.tap('h');
    bench.advance(1400);
    assert!(bench.hw.pump_duty > 0);

    bench.hw.humidity_fails = true;
    bench.advance(1000);
    assert_eq!(bench.hw.pump_duty, 0);
    assert!(!bench.hw.valve_wet);
    assert!(bench.sink.contains(&AppEvent::SensorFault(SensorKind::Humidity)));
    assert!(bench.hw.row(2).contains("ERROR"), "row 2: {:?}", bench.hw.row(2));
    // The loop stays on through the outage.
    assert!(bench.chamber.context().humidity.state.active);

    bench.hw.humidity_fails = false;
    bench.advance(1000);
    assert!(bench.sink.contains(&AppEvent::SensorOnline(SensorKind::Humidity)));
    assert!(bench.hw.row(2).contains("20.0"));
    // Recovery resynchronises without actuating.
    assert_eq!(bench.hw.pump_duty, 0);
}

#[test]
fn humidity_fault_is_reported_once() {
    let mut bench = Bench::new();
    bench.hw.humidity_fails = true;
    bench.advance(3400);
    assert_eq!(
        bench.sink.count(|e| *e == AppEvent::SensorFault(SensorKind::Humidity)),
        1
    );
}

// ── Fan loop ──────────────────────────────────────────────────

#[test]
fn fan_start_pushes_target_and_releases_gate() {
    let mut bench = Bench::new();
    bench.advance(10);
    bench.tap('f');
    assert_eq!(bench.hw.fan_targets, vec![9800.0]);
    assert!(bench.hw.fan_enabled);
    assert!(bench.hw.led_fan);
    assert!(bench.sink.contains(&AppEvent::ControlStarted(ControlLoop::FanSpeed)));

    bench.advance(400);
    assert!(bench.hw.row(3).contains("3000"), "row 3: {:?}", bench.hw.row(3));
}

#[test]
fn fan_reading_after_start_waits_for_next_fetch() {
    let mut bench = Bench::new();
    bench.advance(400);
    assert!(bench.hw.row(3).contains("N/A"), "row 3: {:?}", bench.hw.row(3));

    // The reading fetched at 325 ms was taken while idle.
    bench.tap('f');
    bench.advance(500);
    assert!(bench.hw.row(3).contains("N/A"), "row 3: {:?}", bench.hw.row(3));

    bench.advance(500);
    assert!(bench.hw.row(3).contains("3000"), "row 3: {:?}", bench.hw.row(3));
}

#[test]
fn fan_start_failure_leaves_loop_off() {
    let mut bench = Bench::new();
    bench.hw.fan_rejects_target = true;
    bench.advance(10);
    bench.tap('f');
    assert!(!bench.chamber.context().fan.state.active);
    assert!(!bench.hw.fan_enabled);
    assert!(bench.sink.contains(&AppEvent::ControlStartFailed(ControlLoop::FanSpeed)));
}

#[test]
fn idle_fan_shows_not_available_and_reports_no_fault() {
    let mut bench = Bench::new();
    bench.hw.fan_fails = true;
    bench.advance(2400);
    assert!(bench.hw.row(3).contains("N/A"), "row 3: {:?}", bench.hw.row(3));
    assert!(!bench.sink.contains(&AppEvent::SensorFault(SensorKind::FanSpeed)));
}

// ── Host streaming ────────────────────────────────────────────

#[test]
fn start_send_data_acks_and_streams_frames() {
    let mut bench = Bench::new();
    bench.command(AppCommand::StartSendData);
    assert_eq!(bench.host.lines, vec!["^r|d|y@\n".to_owned()]);
    assert!(bench.chamber.is_streaming());

    bench.advance(330);
    assert_eq!(bench.host.lines.len(), 2);
    assert_eq!(bench.host.lines[1], "^d|45.0|23.0|3000|i|i@\n");
}

#[test]
fn frames_carry_active_targets_and_errors() {
    let mut bench = Bench::new();
    bench.command(AppCommand::StartSendData);
    bench.advance(10);
    bench.tap('h');
    bench.hw.humidity_fails = true;
    bench.advance(400);

    let frame = bench.host.lines.last().unwrap();
    assert_eq!(frame, "^d|e|e|3000|52.5|i@\n");
}

#[test]
fn stop_send_data_ends_stream() {
    let mut bench = Bench::new();
    bench.command(AppCommand::StartSendData);
    bench.advance(330);
    bench.command(AppCommand::StopSendData);
    assert_eq!(bench.host.lines.last().unwrap(), "^r|s|y@\n");

    let sent = bench.host.lines.len();
    bench.advance(2000);
    assert_eq!(bench.host.lines.len(), sent);
    assert!(!bench.chamber.is_streaming());
}

#[test]
fn repeated_start_is_acked_but_toggles_once() {
    let mut bench = Bench::new();
    bench.command(AppCommand::StartSendData);
    bench.command(AppCommand::StartSendData);
    assert_eq!(bench.host.lines.len(), 2);
    assert_eq!(bench.sink.count(|e| matches!(e, AppEvent::StreamingChanged(_))), 1);
}

#[test]
fn menu_keys_do_not_disturb_acquisition() {
    let mut bench = Bench::new();
    bench.advance(10);
    bench.tap('s');
    assert_eq!(bench.chamber.page(), PageId::HumidityAdjust);
    bench.advance(2400);
    assert_eq!(telemetry_count(&bench), 3);
}
