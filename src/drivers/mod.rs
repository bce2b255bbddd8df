//! Stateful I/O conditioning between raw panel samples and the control core.
//!
//! | Driver         | Role                                             |
//! |----------------|--------------------------------------------------|
//! | `actuator`     | command → port writes, clamping, fault reporting |
//! | `button`       | debounced press detection                        |
//! | `encoder`      | absolute count → per-tick delta                  |
//! | `led_patterns` | status-indicator layer resolution                |

pub mod actuator;
pub mod button;
pub mod encoder;
pub mod led_patterns;
