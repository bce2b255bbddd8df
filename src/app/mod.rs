//! Application core: control orchestration, zero direct I/O.
//!
//! This module wires the VaporSur control components (ESD sequencer,
//! safety overrides, setpoint input, flow and status classification,
//! telemetry) into one tick.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
