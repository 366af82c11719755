//! Periodic sensor acquisition with split trigger / fetch phases.
//!
//! ```text
//!   anchor              P − L              P
//!     │─────── idle ──────│── converting ──│
//!                      trigger           fetch (humidity + fan), anchor := now
//! ```
//!
//! The humidity sensor needs a conversion latency `L` between trigger and
//! fetch, so the trigger is issued `L` before the end of each period `P`.
//! The fan controller has no trigger phase; its speed is polled in the
//! same tick as the humidity fetch.
//!
//! All timing is `now.wrapping_sub(anchor)` on a `u32` millisecond counter,
//! which stays correct across the counter's wraparound.

use log::{debug, warn};

use crate::app::ports::{FanControllerPort, HumiditySensorPort, Repeatability};
use crate::retry::retry;

// ---------------------------------------------------------------------------
// SensorReading
// ---------------------------------------------------------------------------

/// Latest value of one measured quantity plus its one-shot freshness flags.
///
/// Display and control consume readings independently: clearing one flag
/// never touches the other.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    value: f32,
    ok: bool,
    fresh_display: bool,
    fresh_control: bool,
}

impl SensorReading {
    /// Record a successful fetch; both freshness flags are raised.
    pub fn accept(&mut self, value: f32) {
        self.value = value;
        self.ok = true;
        self.fresh_display = true;
        self.fresh_control = true;
    }

    /// Record a failed fetch.  The last good value is kept but the reading
    /// is marked not OK and nothing is fresh.
    pub fn fail(&mut self) {
        self.ok = false;
        self.fresh_display = false;
        self.fresh_control = false;
    }

    /// Consume the display flag; true exactly once per successful fetch.
    pub fn take_for_display(&mut self) -> bool {
        core::mem::take(&mut self.fresh_display)
    }

    /// Consume the control flag; true exactly once per successful fetch.
    pub fn take_for_control(&mut self) -> bool {
        core::mem::take(&mut self.fresh_control)
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// `Some(value)` when the last fetch succeeded.
    pub fn get(&self) -> Option<f32> {
        self.ok.then_some(self.value)
    }
}

// ---------------------------------------------------------------------------
// Acquisition scheduler
// ---------------------------------------------------------------------------

/// What a call to [`Acquisition::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing due yet.
    Idle,
    /// A humidity conversion was started (or attempted).
    Triggered,
    /// Readings were fetched; the period restarted.
    Fetched,
}

pub struct Acquisition {
    period_ms: u32,
    latency_ms: u32,
    anchor_ms: u32,
    trigger_pending: bool,
    trigger_ok: bool,
    pub humidity: SensorReading,
    pub temperature: SensorReading,
    pub fan_speed: SensorReading,
}

impl Acquisition {
    pub fn new(period_ms: u32, latency_ms: u32) -> Self {
        Self {
            period_ms,
            latency_ms,
            anchor_ms: 0,
            trigger_pending: false,
            trigger_ok: false,
            humidity: SensorReading::default(),
            temperature: SensorReading::default(),
            fan_speed: SensorReading::default(),
        }
    }

    /// Issue the first trigger and place the anchor so the first fetch
    /// happens one conversion latency (plus 10 ms) from `now_ms`.
    pub fn prime(&mut self, now_ms: u32, sensor: &mut impl HumiditySensorPort) {
        self.trigger(sensor);
        self.anchor_ms = now_ms
            .wrapping_sub(self.period_ms)
            .wrapping_add(self.latency_ms + 10);
    }

    /// Advance the trigger / fetch cycle.  Never blocks beyond the bounded
    /// device calls themselves.
    pub fn poll<H>(&mut self, now_ms: u32, hw: &mut H) -> Step
    where
        H: HumiditySensorPort + FanControllerPort,
    {
        let elapsed = now_ms.wrapping_sub(self.anchor_ms);
        if elapsed < self.period_ms.saturating_sub(self.latency_ms) {
            return Step::Idle;
        }

        if self.trigger_pending && elapsed >= self.period_ms {
            self.anchor_ms = now_ms;
            self.fetch(hw);
            self.trigger_pending = false;
            Step::Fetched
        } else if !self.trigger_pending {
            self.trigger(hw);
            Step::Triggered
        } else {
            Step::Idle
        }
    }

    fn trigger(&mut self, sensor: &mut impl HumiditySensorPort) {
        self.trigger_ok = retry(|| sensor.trigger_measurement(Repeatability::High)).is_ok();
        if !self.trigger_ok {
            warn!("acquisition: humidity trigger failed");
        }
        // A failed trigger still counts as attempted; the next real attempt
        // happens next period.
        self.trigger_pending = true;
    }

    fn fetch<H>(&mut self, hw: &mut H)
    where
        H: HumiditySensorPort + FanControllerPort,
    {
        let measurement = if self.trigger_ok {
            retry(|| hw.fetch_measurement()).ok()
        } else {
            None
        };
        match measurement {
            Some(m) => {
                self.humidity.accept(m.humidity);
                self.temperature.accept(m.temperature);
            }
            None => {
                self.humidity.fail();
                self.temperature.fail();
            }
        }

        match retry(|| hw.fetch_speed()) {
            Ok(rpm) => self.fan_speed.accept(rpm),
            Err(e) => {
                debug!("acquisition: fan speed fetch failed: {}", e);
                self.fan_speed.fail();
            }
        }
    }
}
