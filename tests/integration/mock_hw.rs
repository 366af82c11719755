//! Mock hardware for integration tests.
//!
//! `MockHardware` implements every device port.  The display keeps a
//! 20×4 character grid so tests can assert on what the operator would
//! see; the sensor, fan controller and actuators record their calls.

use hygrostat::app::events::AppEvent;
use hygrostat::app::ports::{
    ActuatorPort, CalibrationPoint, CalibrationPointId, DisplayPort, EventSink, FanControllerPort, FanSetup, HostLink,
    HumiditySensorPort, Indicator, Measurement, Repeatability, Valve,
};
use hygrostat::error::DeviceError;

const COLUMNS: usize = 20;
const ROWS: usize = 4;

pub struct MockHardware {
    // Humidity sensor
    pub humidity: f32,
    pub temperature: f32,
    pub humidity_fails: bool,
    pub triggers: u32,
    pub calibration: [Option<CalibrationPoint>; 2],

    // Fan controller
    pub fan_rpm: f32,
    pub fan_fails: bool,
    pub fan_rejects_target: bool,
    pub fan_targets: Vec<f32>,
    pub fan_setup: Option<FanSetup>,

    // Display
    grid: [[char; COLUMNS]; ROWS],
    cursor: (usize, usize),
    pub blink: bool,

    // Actuators
    pub pump_duty: u8,
    pub valve_wet: bool,
    pub valve_dry: bool,
    pub fan_enabled: bool,
    pub led_humidity: bool,
    pub led_fan: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            humidity: 45.0,
            temperature: 23.0,
            humidity_fails: false,
            triggers: 0,
            calibration: [None, None],
            fan_rpm: 3000.0,
            fan_fails: false,
            fan_rejects_target: false,
            fan_targets: Vec::new(),
            fan_setup: None,
            grid: [[' '; COLUMNS]; ROWS],
            cursor: (0, 0),
            blink: false,
            pump_duty: 0,
            valve_wet: false,
            valve_dry: false,
            fan_enabled: false,
            led_humidity: false,
            led_fan: false,
        }
    }

    /// One display row as text.
    pub fn row(&self, row: usize) -> String {
        self.grid[row].iter().collect()
    }

    /// Whole display, rows joined with `\n`.
    pub fn screen(&self) -> String {
        (0..ROWS).map(|r| self.row(r)).collect::<Vec<_>>().join("\n")
    }

    pub fn shows(&self, text: &str) -> bool {
        (0..ROWS).any(|r| self.row(r).contains(text))
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(id: CalibrationPointId) -> usize {
    match id {
        CalibrationPointId::One => 0,
        CalibrationPointId::Two => 1,
    }
}

impl HumiditySensorPort for MockHardware {
    fn trigger_measurement(&mut self, _: Repeatability) -> Result<(), DeviceError> {
        self.triggers += 1;
        Ok(())
    }

    fn fetch_measurement(&mut self) -> Result<Measurement, DeviceError> {
        if self.humidity_fails {
            return Err(DeviceError::Crc);
        }
        Ok(Measurement {
            humidity: self.humidity,
            temperature: self.temperature,
        })
    }

    fn raw_humidity(&self) -> f32 {
        self.humidity
    }

    fn saved_calibration(&self, id: CalibrationPointId) -> Option<CalibrationPoint> {
        self.calibration[slot(id)]
    }

    fn save_calibration(&mut self, id: CalibrationPointId, point: CalibrationPoint) -> Result<(), DeviceError> {
        self.calibration[slot(id)] = Some(point);
        Ok(())
    }

    fn reset_calibration(&mut self) -> Result<(), DeviceError> {
        self.calibration = [None, None];
        Ok(())
    }
}

impl FanControllerPort for MockHardware {
    fn configure(&mut self, setup: &FanSetup) -> Result<(), DeviceError> {
        self.fan_setup = Some(*setup);
        Ok(())
    }

    fn fetch_speed(&mut self) -> Result<f32, DeviceError> {
        if self.fan_fails {
            return Err(DeviceError::Nack);
        }
        Ok(self.fan_rpm)
    }

    fn set_speed_target(&mut self, rpm: f32) -> Result<(), DeviceError> {
        if self.fan_rejects_target {
            return Err(DeviceError::Nack);
        }
        self.fan_targets.push(rpm);
        Ok(())
    }
}

impl DisplayPort for MockHardware {
    fn clear(&mut self) -> Result<(), DeviceError> {
        self.grid = [[' '; COLUMNS]; ROWS];
        self.cursor = (0, 0);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DeviceError> {
        self.cursor = ((col as usize).min(COLUMNS - 1), (row as usize).min(ROWS - 1));
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), DeviceError> {
        let (mut col, row) = self.cursor;
        for c in text.chars() {
            if col < COLUMNS {
                self.grid[row][col] = c;
            }
            col += 1;
        }
        self.cursor = (col.min(COLUMNS - 1), row);
        Ok(())
    }

    fn set_blink(&mut self, on: bool) -> Result<(), DeviceError> {
        self.blink = on;
        Ok(())
    }

    fn set_backlight(&mut self, _: u32) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_contrast(&mut self, _: u8) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump_duty(&mut self, duty: u8) {
        self.pump_duty = duty;
    }

    fn set_valve(&mut self, valve: Valve, open: bool) {
        match valve {
            Valve::Wet => self.valve_wet = open,
            Valve::Dry => self.valve_dry = open,
        }
    }

    fn set_fan_enabled(&mut self, enabled: bool) {
        self.fan_enabled = enabled;
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::Humidity => self.led_humidity = on,
            Indicator::Fan => self.led_fan = on,
        }
    }
}

// ── Host link ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockHost {
    pub lines: Vec<String>,
}

impl HostLink for MockHost {
    fn send(&mut self, line: &str) -> Result<(), DeviceError> {
        self.lines.push(line.to_owned());
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Bench: chamber plus mocks on a simulated clock ────────────

use hygrostat::app::commands::{AppCommand, KeyEvent};
use hygrostat::app::service::Chamber;
use hygrostat::config::SystemConfig;

/// Main-loop pacing used by [`Bench::advance`].
pub const TICK_MS: u32 = 5;

pub struct Bench {
    pub chamber: Chamber,
    pub hw: MockHardware,
    pub host: MockHost,
    pub sink: RecordingSink,
    pub now: u32,
}

#[allow(dead_code)]
impl Bench {
    /// Default config, initialised at t = 0.  Nothing has run yet.
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        let mut bench = Self {
            chamber: Chamber::new(config).unwrap(),
            hw: MockHardware::new(),
            host: MockHost::default(),
            sink: RecordingSink::default(),
            now: 0,
        };
        bench.chamber.init(0, &mut bench.hw, &mut bench.sink);
        bench
    }

    /// Run the main loop for `ms` of simulated time.
    pub fn advance(&mut self, ms: u32) {
        let end = self.now + ms;
        while self.now < end {
            self.now = (self.now + TICK_MS).min(end);
            self.chamber.run(self.now, &mut self.hw, &mut self.host, &mut self.sink);
        }
    }

    pub fn key(&mut self, event: KeyEvent) {
        self.chamber.handle_key(event, self.now, &mut self.hw, &mut self.sink);
    }

    /// Press and release, then let the screen catch up.
    pub fn tap(&mut self, key: char) {
        self.key(KeyEvent::pressed(key));
        self.key(KeyEvent::released(key));
        self.advance(TICK_MS);
    }

    pub fn type_keys(&mut self, keys: &str) {
        for key in keys.chars() {
            self.tap(key);
        }
    }

    pub fn command(&mut self, cmd: AppCommand) {
        self.chamber.handle_command(cmd, &mut self.host, &mut self.sink);
    }
}
