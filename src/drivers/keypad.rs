//! 4×4 matrix keypad: scanning, debounce, and press / hold / release events.
//!
//! ## Hardware
//!
//! Rows are outputs idling HIGH; columns are inputs with pull-ups.  A scan
//! drives one row LOW at a time and reads the columns: a LOW column means
//! the key at (row, column) is down.  Only one key is tracked at a time.
//!
//! ## Events
//!
//! | Event      | Condition                                     |
//! |------------|-----------------------------------------------|
//! | `Pressed`  | Same key seen for the debounce interval       |
//! | `Hold`     | Still down `hold_ms` after `Pressed` (once)   |
//! | `Released` | Key no longer seen after `Pressed`            |
//!
//! ```text
//!  ┌───┬───┬───┬───┐
//!  │ 1 │ 2 │ 3 │ h │   h: humidity loop
//!  │ 4 │ 5 │ 6 │ f │   f: fan loop
//!  │ 7 │ 8 │ 9 │ s │   s: menu / save
//!  │ . │ 0 │ d │   │   d: delete
//!  └───┴───┴───┴───┘
//! ```

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::commands::KeyEvent;

pub const KEYMAP: [[Option<char>; 4]; 4] = [
    [Some('1'), Some('2'), Some('3'), Some('h')],
    [Some('4'), Some('5'), Some('6'), Some('f')],
    [Some('7'), Some('8'), Some('9'), Some('s')],
    [Some('.'), Some('0'), Some('d'), None],
];

const DEBOUNCE_MS: u32 = 10;

/// Simulated key for host builds (`0` = none).
#[cfg(not(target_os = "espidf"))]
static SIM_KEY: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_key(key: Option<char>) {
    SIM_KEY.store(key.map_or(0, u32::from), Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Idle,
    Debounce { key: char, since_ms: u32 },
    Down { key: char, since_ms: u32, held: bool },
}

pub struct Keypad {
    state: KeyState,
    hold_ms: u32,
}

impl Keypad {
    /// `hold_ms` is how long a key must stay down to report `Hold`.
    pub fn new(hold_ms: u32) -> Self {
        Self {
            state: KeyState::Idle,
            hold_ms,
        }
    }

    /// Scan the matrix and advance the state machine.
    pub fn poll(&mut self, now_ms: u32) -> Option<KeyEvent> {
        let raw = Self::scan();
        self.tick(now_ms, raw)
    }

    /// Advance the state machine with an already scanned key.
    pub fn tick(&mut self, now_ms: u32, raw: Option<char>) -> Option<KeyEvent> {
        match self.state {
            KeyState::Idle => {
                if let Some(key) = raw {
                    self.state = KeyState::Debounce { key, since_ms: now_ms };
                }
                None
            }

            KeyState::Debounce { key, since_ms } => {
                if raw != Some(key) {
                    // Bounce; start over with whatever is down now.
                    self.state = KeyState::Idle;
                    return self.tick(now_ms, raw);
                }
                if now_ms.wrapping_sub(since_ms) < DEBOUNCE_MS {
                    return None;
                }
                self.state = KeyState::Down {
                    key,
                    since_ms: now_ms,
                    held: false,
                };
                Some(KeyEvent::pressed(key))
            }

            KeyState::Down { key, since_ms, held } => {
                if raw != Some(key) {
                    self.state = KeyState::Idle;
                    return Some(KeyEvent::released(key));
                }
                if !held && now_ms.wrapping_sub(since_ms) >= self.hold_ms {
                    self.state = KeyState::Down {
                        key,
                        since_ms,
                        held: true,
                    };
                    return Some(KeyEvent::hold(key));
                }
                None
            }
        }
    }

    /// First key found down, scanning row by row.
    #[cfg(target_os = "espidf")]
    pub fn scan() -> Option<char> {
        use crate::drivers::hw_init::{gpio_read, gpio_write};
        use crate::pins::{KEYPAD_COL_GPIOS, KEYPAD_ROW_GPIOS};

        let mut found = None;
        for (r, &row) in KEYPAD_ROW_GPIOS.iter().enumerate() {
            gpio_write(row, false);
            for (c, &col) in KEYPAD_COL_GPIOS.iter().enumerate() {
                if found.is_none() && !gpio_read(col) {
                    found = KEYMAP[r][c];
                }
            }
            gpio_write(row, true);
            if found.is_some() {
                break;
            }
        }
        found
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn scan() -> Option<char> {
        char::from_u32(SIM_KEY.load(Ordering::Relaxed)).filter(|&c| c != '\0')
    }
}
