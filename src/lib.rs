//! VaporSur steam-distribution node controller.
//!
//! Regulates line pressure and superheat temperature from operator
//! setpoints, latches low-pressure recovery and preheat overrides,
//! runs a latching emergency shutdown (ESD) that drives the plant back
//! to nominal, classifies the distribution regime and streams telemetry.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  SimulatedPanel / GpioPanel   SerialTelemetry   LogEventSink │
//! │  (Input + Actuator)           (TelemetrySink)   (EventSink)  │
//! │  MonotonicClock / SimClock    JsonFileConfig                 │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                ControlLoop (pure logic)                │  │
//! │  │  ESD · Safety · Setpoint · Process · Flow · Status     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod esd;
pub mod flow;
pub mod process;
pub mod safety;
pub mod setpoint;
pub mod status;
pub mod telemetry;

pub mod adapters;
pub mod drivers;

pub use app::service::{ControlLoop, TickReport};
pub use config::SystemConfig;
pub use error::{Error, Result};
