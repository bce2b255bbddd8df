//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade (stderr via `env_logger` on the host, UART
//! on a board).  Telemetry lines travel separately, so the two streams
//! never interleave.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { standby_ms } => {
                info!("START | standby={}ms", standby_ms);
            }
            AppEvent::ControlEngaged => {
                info!("START | control engaged");
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE | {}", mode.label());
            }
            AppEvent::OverrideChanged(change) => {
                let verb = if change.active { "set" } else { "cleared" };
                info!("OVERRIDE | {} {}", change.kind, verb);
            }
            AppEvent::EsdTransition(t) => {
                info!("ESD | {} -> {} ({})", t.from.name(), t.to.name(), t.trigger);
            }
            AppEvent::ActuatorFault(e) => {
                error!("FAULT | actuator: {}", e);
            }
            AppEvent::TelemetryFault(e) => {
                warn!("FAULT | telemetry: {}", e);
            }
        }
    }
}
