//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                   | Connects to                 |
//! |------------|------------------------------|-----------------------------|
//! | `hardware` | Humidity / fan / display /   | I2C drivers, GPIO, LEDC     |
//! |            | actuator ports               |                             |
//! | `log_sink` | EventSink                    | Serial log output           |
//! | `nvs`      | StoragePort                  | NVS / in-memory store       |
//! | `serial`   | HostLink                     | UART to the host PC         |
//! | `time`     | (monotonic clock)            | ESP32 system timer          |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial;
pub mod time;
