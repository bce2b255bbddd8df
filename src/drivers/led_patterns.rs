//! Status-indicator pattern engine with priority-based layer selection.
//!
//! Produces the RGB value for the status indicator.  The control loop
//! updates the layers from the tick's [`SystemStatus`](crate::status::SystemStatus) and calls `tick()`
//! with the tick's time sample; the result feeds the actuator port.
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **ESD**: red blink while Active, solid green while ReadyForReset
//! 2. **Mode flash**: transient overlay after a mode toggle
//! 3. **Status**: solid colour for the current status
//!
//! ## Pattern types
//!
//! | Pattern | Description                         | Rate           |
//! |---------|-------------------------------------|----------------|
//! | Solid   | Constant colour                     | -              |
//! | Blink   | On/off square wave                  | 500 ms / 500 ms |
//! | Off     | Dark                                | -              |
//!
//! The mode flash alternates the mode colour (80 ms) with green (60 ms)
//! for a configured number of cycles, then expires on its own.  It never
//! blocks the loop.
//!
//! [`SystemStatus`]: crate::status::SystemStatus

use crate::context::Mode;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Solid,
    Blink,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRequest {
    pub colour: Rgb,
    pub pattern: PatternId,
}

#[derive(Debug, Clone, Copy)]
struct ModeFlash {
    colour: Rgb,
    started_at_ms: u64,
    cycles: u8,
}

/// Half-period of the blink pattern.
pub const BLINK_HALF_PERIOD_MS: u64 = 500;
/// Mode colour portion of one flash cycle.
pub const FLASH_ON_MS: u64 = 80;
/// Green portion of one flash cycle.
pub const FLASH_GAP_MS: u64 = 60;

pub struct LedPatternEngine {
    esd_request: Option<PatternRequest>,
    flash: Option<ModeFlash>,
    status_request: Option<PatternRequest>,
    flash_cycles: u8,
}

impl LedPatternEngine {
    pub fn new(flash_cycles: u8) -> Self {
        Self {
            esd_request: None,
            flash: None,
            status_request: None,
            flash_cycles,
        }
    }

    /// Set or clear the ESD layer (highest priority).
    pub fn set_esd_pattern(&mut self, request: Option<PatternRequest>) {
        self.esd_request = request;
    }

    /// Set the status layer (lowest priority).
    pub fn set_status_pattern(&mut self, colour: Rgb, pattern: PatternId) {
        self.status_request = Some(PatternRequest { colour, pattern });
    }

    /// Start a mode-change flash at `now_ms`, replacing any flash in progress.
    pub fn start_mode_flash(&mut self, mode: Mode, now_ms: u64) {
        if self.flash_cycles == 0 {
            return;
        }
        let colour = match mode {
            Mode::Pressure => COLOUR_MODE_PRESSURE,
            Mode::Temperature => COLOUR_MODE_TEMPERATURE,
        };
        self.flash = Some(ModeFlash {
            colour,
            started_at_ms: now_ms,
            cycles: self.flash_cycles,
        });
    }

    pub fn flash_active(&self) -> bool {
        self.flash.is_some()
    }

    /// Resolve the layers at `now_ms` and return the indicator colour.
    pub fn tick(&mut self, now_ms: u64) -> Rgb {
        if let Some(req) = self.esd_request {
            return Self::generate(req, now_ms);
        }
        if let Some(rgb) = self.flash_colour(now_ms) {
            return rgb;
        }
        match self.status_request {
            Some(req) => Self::generate(req, now_ms),
            None => COLOUR_OFF,
        }
    }

    /// Current flash colour, expiring the flash once its cycles are done.
    fn flash_colour(&mut self, now_ms: u64) -> Option<Rgb> {
        let flash = self.flash?;
        let cycle_ms = FLASH_ON_MS + FLASH_GAP_MS;
        let elapsed = now_ms.saturating_sub(flash.started_at_ms);
        if elapsed >= cycle_ms * u64::from(flash.cycles) {
            self.flash = None;
            return None;
        }
        if elapsed % cycle_ms < FLASH_ON_MS {
            Some(flash.colour)
        } else {
            Some(COLOUR_NORMAL)
        }
    }

    fn generate(req: PatternRequest, now_ms: u64) -> Rgb {
        match req.pattern {
            PatternId::Solid => req.colour,
            PatternId::Off => COLOUR_OFF,
            PatternId::Blink => {
                let on = (now_ms / BLINK_HALF_PERIOD_MS) % 2 == 0;
                if on { req.colour } else { COLOUR_OFF }
            }
        }
    }
}

// ── Well-known colour constants ───────────────────────────────

pub const COLOUR_OFF: Rgb = (0, 0, 0);
pub const COLOUR_NORMAL: Rgb = (0, 255, 0); // Green
pub const COLOUR_WARNING: Rgb = (255, 165, 0); // Orange
pub const COLOUR_CRITICAL: Rgb = (255, 0, 0); // Red
pub const COLOUR_OVERRIDE: Rgb = (0, 255, 255); // Cyan
pub const COLOUR_MODE_PRESSURE: Rgb = (255, 255, 255); // White
pub const COLOUR_MODE_TEMPERATURE: Rgb = (0, 100, 255); // Blue
