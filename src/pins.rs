//! GPIO / peripheral pin assignments for the chamber controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Misting pump (logic-level MOSFET, low-side)
// ---------------------------------------------------------------------------

/// LEDC PWM output for pump duty (0-255).
pub const PUMP_PWM_GPIO: i32 = 1;

// ---------------------------------------------------------------------------
// Solenoid valves (digital, active HIGH)
// ---------------------------------------------------------------------------

/// Routes pump air through the desiccant column.
pub const VALVE_DRY_GPIO: i32 = 2;
/// Routes pump air through the water bubbler.
pub const VALVE_WET_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Fan
// ---------------------------------------------------------------------------

/// Drains the fan controller's PWM output to ground when HIGH.
/// LOW lets the EMC2301 drive the fan.
pub const FAN_PWM_DRAIN_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Status LEDs (digital, active HIGH)
// ---------------------------------------------------------------------------

pub const LED_HUMIDITY_GPIO: i32 = 5;
pub const LED_FAN_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// 4x4 matrix keypad
// ---------------------------------------------------------------------------

/// Row lines, driven LOW one at a time during a scan.
pub const KEYPAD_ROW_GPIOS: [i32; 4] = [7, 8, 9, 10];
/// Column lines, inputs with pull-ups.  LOW = key in the active row pressed.
pub const KEYPAD_COL_GPIOS: [i32; 4] = [11, 12, 13, 16];

// ---------------------------------------------------------------------------
// I²C bus (SHT35 humidity sensor, EMC2301 fan controller, SerLCD)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
/// SMBus devices on the bus forbid anything faster than 100 kHz.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Host serial link
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
pub const UART_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the pump (25 kHz, above hearing).
pub const PUMP_PWM_FREQ_HZ: u32 = 25_000;
