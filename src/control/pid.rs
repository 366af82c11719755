//! PID controller for chamber humidity
//!
//! Proportional-on-measurement form: the proportional term acts on the
//! change in measurement rather than on the error, so target changes
//! entered on the keypad do not kick the pump.  The integral term carries
//! both the I contribution and the accumulated P contribution and is
//! clamped to the output limits (anti-windup).
//!
//! Time is supplied by the caller as a wrapping millisecond counter; the
//! controller never reads a clock itself.

/// PID controller
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    /// Previous measurement and its timestamp; `None` right after a reset.
    last: Option<(f32, u32)>,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            integral: 0.0,
            last: None,
            output_min: -255.0,
            output_max: 255.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        if min >= max {
            return;
        }
        self.output_min = min;
        self.output_max = max;
        self.integral = self.integral.clamp(min, max);
    }

    /// Update setpoint
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Compute PID output for `measurement` taken at `now_ms`.
    ///
    /// The elapsed time since the previous compute (or [`seed`](Self::seed))
    /// scales the integral and derivative terms.  The first compute after a
    /// reset has no previous measurement, so the proportional term is taken
    /// against the set-point and the I and D terms contribute nothing.
    pub fn compute(&mut self, measurement: f32, now_ms: u32) -> f32 {
        let error = self.setpoint - measurement;

        let d = match self.last {
            Some((last_input, last_ms)) => {
                let dt = now_ms.wrapping_sub(last_ms) as f32 / 1000.0;
                let d_input = measurement - last_input;
                // Integral plus accumulated proportional-on-measurement
                self.integral += self.ki * error * dt - self.kp * d_input;
                // Derivative on measurement
                if dt > 0.0 { -self.kd * d_input / dt } else { 0.0 }
            }
            None => {
                self.integral += self.kp * error;
                0.0
            }
        };

        // Anti-windup
        self.integral = self.integral.clamp(self.output_min, self.output_max);
        self.last = Some((measurement, now_ms));

        (self.integral + d).clamp(self.output_min, self.output_max)
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last = None;
    }

    /// Resynchronise the time base and last measurement, e.g. after a
    /// sensor outage, so the next compute sees no derivative step.
    pub fn seed(&mut self, last_input: f32, now_ms: u32) {
        self.last = Some((last_input, now_ms));
    }
}
