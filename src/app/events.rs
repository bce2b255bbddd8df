//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (log line, test recorder).

use crate::context::Mode;
use crate::error::{ActuatorError, TelemetryError};
use crate::esd::EsdTransition;
use crate::safety::OverrideChange;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The loop has started; outputs are off and standby is running.
    Started { standby_ms: u32 },

    /// Standby elapsed; control logic is live.
    ControlEngaged,

    /// The operator toggled the encoder mode.
    ModeChanged(Mode),

    /// A recovery or preheat latch was set or cleared.
    OverrideChanged(OverrideChange),

    /// The ESD sequencer changed state.
    EsdTransition(EsdTransition),

    /// An actuator write failed this tick.
    ActuatorFault(ActuatorError),

    /// A telemetry record could not be encoded or sent.
    TelemetryFault(TelemetryError),
}
