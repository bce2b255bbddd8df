//! Serial telemetry adapters.
//!
//! [`SerialTelemetry`] writes the line protocol, newline-terminated, to
//! any `std::io::Write` (stdout on the host, a UART writer on a board).
//! [`JsonTelemetry`] writes one JSON object per line instead, for tools
//! that prefer structured input.

use std::io::Write;

use log::debug;

use crate::app::ports::TelemetrySink;
use crate::error::TelemetryError;
use crate::telemetry::TelemetryRecord;

pub struct SerialTelemetry<W: Write> {
    writer: W,
}

impl<W: Write> SerialTelemetry<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for SerialTelemetry<W> {
    fn send_line(&mut self, line: &str) -> Result<(), TelemetryError> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| {
                debug!("telemetry write failed: {e}");
                TelemetryError::Io
            })
    }
}

pub struct JsonTelemetry<W: Write> {
    writer: W,
}

impl<W: Write> JsonTelemetry<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for JsonTelemetry<W> {
    fn send_line(&mut self, line: &str) -> Result<(), TelemetryError> {
        writeln!(self.writer, "{line}").map_err(|_| TelemetryError::Io)
    }

    fn publish(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let json = serde_json::to_string(record).map_err(|e| {
            debug!("telemetry serialisation failed: {e}");
            TelemetryError::Overflow
        })?;
        self.send_line(&json)?;
        self.writer.flush().map_err(|_| TelemetryError::Io)
    }
}
