//! Application service: the hexagonal core.
//!
//! [`Chamber`] owns the shared context and the screen machine.  It exposes
//! a hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, making the whole service testable with mock adapters.
//!
//! ```text
//!  HumiditySensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!   FanControllerPort ◀─▶ │         Chamber          │ ──▶ HostLink
//!        ActuatorPort ◀── │ Acquisition · PID · UI   │
//!         DisplayPort ◀── └──────────────────────────┘ ◀── KeyEvent / AppCommand
//! ```

use log::{info, warn};

use crate::acquisition::Step;
use crate::app::ports::ConfigError;
use crate::config::SystemConfig;
use crate::protocol::{encode_ack, encode_data_frame};
use crate::retry::retry;
use crate::ui::render::{COLUMNS, Lcd, STARS};
use crate::ui::{PageId, Screen};

use super::commands::{AppCommand, KeyEvent};
use super::context::ChamberContext;
use super::events::{AppEvent, SensorKind};
use super::ports::{EventSink, FanSetup, Hardware, HostLink};

const SPLASH_TITLE: &str = "---> HYGROSTAT <---";
const SPLASH_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

// ───────────────────────────────────────────────────────────────
// Chamber
// ───────────────────────────────────────────────────────────────

/// The humidity chamber controller.
pub struct Chamber {
    ctx: ChamberContext,
    screen: Screen,
    humidity_was_ok: bool,
    fan_was_ok: bool,
}

impl Chamber {
    /// Validate the configuration and build the controller.
    ///
    /// Does **not** touch hardware; call [`init`](Self::init) next.
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ctx: ChamberContext::new(config),
            screen: Screen::new(),
            // Assume healthy so the first failure is reported.
            humidity_was_ok: true,
            fan_was_ok: true,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// One-time bring-up: configure the fan controller, set up the panel,
    /// draw the splash screen, and issue the first humidity trigger.
    ///
    /// The splash stays up until the first [`run`](Self::run) draws the
    /// readings page; the caller decides how long that is.
    pub fn init<H: Hardware>(&mut self, now_ms: u32, hw: &mut H, sink: &mut dyn EventSink) {
        let config = &self.ctx.config;
        let setup = FanSetup {
            abs_min_rpm: config.limits.fan_abs_min,
            spin_up_drive_percent: config.fan_spin_up_drive_percent,
            min_drive_percent: config.limits.fan_min_drive,
        };
        if let Err(e) = retry(|| hw.configure(&setup)) {
            warn!("init: fan controller setup failed: {}", e);
        }
        hw.all_off();

        let mut lcd = Lcd::new(&mut *hw);
        lcd.backlight(config.backlight_rgb);
        lcd.contrast(config.contrast);
        lcd.reset();
        lcd.at(0, 0, STARS);
        lcd.at(0, 1, SPLASH_TITLE);
        lcd.at((COLUMNS / 2).saturating_sub(SPLASH_VERSION.len() as u8 / 2), 2, SPLASH_VERSION);
        lcd.at(0, 3, STARS);

        self.ctx.acquisition.prime(now_ms, hw);
        sink.emit(&AppEvent::Started);
        info!("Chamber started: period {} ms", self.ctx.config.acquisition_period_ms);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One pass of the main loop: acquisition, humidity regulation, then
    /// the screen.  Never blocks beyond the bounded device calls.
    pub fn run<H: Hardware>(
        &mut self,
        now_ms: u32,
        hw: &mut H,
        host: &mut impl HostLink,
        sink: &mut dyn EventSink,
    ) {
        if self.ctx.acquisition.poll(now_ms, hw) == Step::Fetched {
            self.after_fetch(host, sink);
        }

        let acq = &mut self.ctx.acquisition;
        self.ctx.humidity.regulate(&mut acq.humidity, hw, now_ms);

        self.screen.refresh(&mut self.ctx, hw, sink, now_ms);
    }

    fn after_fetch(&mut self, host: &mut impl HostLink, sink: &mut dyn EventSink) {
        let humidity_ok = self.ctx.acquisition.humidity.is_ok();
        report_health(SensorKind::Humidity, humidity_ok, &mut self.humidity_was_ok, sink);
        // The tachometer is only meaningful while the fan loop runs.
        if self.ctx.fan.state.active {
            let fan_ok = self.ctx.acquisition.fan_speed.is_ok();
            report_health(SensorKind::FanSpeed, fan_ok, &mut self.fan_was_ok, sink);
        }

        let telemetry = self.ctx.telemetry();
        if self.ctx.streaming {
            match encode_data_frame(&telemetry) {
                Ok(frame) => {
                    if let Err(e) = host.send(&frame) {
                        warn!("host: data frame not sent: {}", e);
                    }
                }
                Err(_) => warn!("host: data frame overflow"),
            }
        }
        sink.emit(&AppEvent::Telemetry(telemetry));
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Route a keypad event to the current page.
    pub fn handle_key<H: Hardware>(&mut self, event: KeyEvent, now_ms: u32, hw: &mut H, sink: &mut dyn EventSink) {
        self.screen.handle_key(event, &mut self.ctx, hw, sink, now_ms);
    }

    /// Execute a parsed host command and acknowledge it.
    pub fn handle_command(&mut self, cmd: AppCommand, host: &mut impl HostLink, sink: &mut dyn EventSink) {
        match cmd {
            AppCommand::StartSendData => self.start_send_data(sink),
            AppCommand::StopSendData => self.stop_send_data(sink),
        }
        match encode_ack(cmd.code(), true) {
            Ok(ack) => {
                if let Err(e) = host.send(&ack) {
                    warn!("host: ack not sent: {}", e);
                }
            }
            Err(_) => warn!("host: ack overflow"),
        }
    }

    /// Emit a data frame after every fetch from now on.
    pub fn start_send_data(&mut self, sink: &mut dyn EventSink) {
        if !self.ctx.streaming {
            self.ctx.streaming = true;
            sink.emit(&AppEvent::StreamingChanged(true));
        }
    }

    pub fn stop_send_data(&mut self, sink: &mut dyn EventSink) {
        if self.ctx.streaming {
            self.ctx.streaming = false;
            sink.emit(&AppEvent::StreamingChanged(false));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn page(&self) -> PageId {
        self.screen.current()
    }

    pub fn context(&self) -> &ChamberContext {
        &self.ctx
    }

    pub fn is_streaming(&self) -> bool {
        self.ctx.streaming
    }
}

fn report_health(kind: SensorKind, ok: bool, was_ok: &mut bool, sink: &mut dyn EventSink) {
    if ok == *was_ok {
        return;
    }
    *was_ok = ok;
    if ok {
        info!("{:?} sensor back online", kind);
        sink.emit(&AppEvent::SensorOnline(kind));
    } else {
        warn!("{:?} sensor fault", kind);
        sink.emit(&AppEvent::SensorFault(kind));
    }
}
