//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                | Connects to                   |
//! |---------------|---------------------------|-------------------------------|
//! | `sim`         | InputPort, ActuatorPort   | scripted operator, recorder   |
//! |               | ClockPort                 | simulated time                |
//! | `gpio`        | InputPort, ActuatorPort   | embedded-hal pins and PWM     |
//! | `log_sink`    | EventSink                 | `log` facade                  |
//! | `serial`      | TelemetrySink             | any `std::io::Write`          |
//! | `time`        | ClockPort                 | `std::time::Instant`          |
//! | `config_file` | ConfigPort                | JSON file                     |

pub mod config_file;
pub mod gpio;
pub mod log_sink;
pub mod serial;
pub mod sim;
pub mod time;
