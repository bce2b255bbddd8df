//! Distribution-regime classification.
//!
//! | Regime | Pressure (kPa) | Temperature (°C) | Flow indicator          |
//! |--------|----------------|------------------|-------------------------|
//! | A      | 310 – 350      | 140 – 160        | blinks, 100 ms on / off |
//! | B      | 260 – 300      | 160 – 170        | solid                   |
//! | None   | anything else  |                  | off                     |
//!
//! Bands are inclusive on both ends; A is checked first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlowRegime {
    /// Large-volume processes at constant pressure.
    A,
    /// Sensitive processes needing dry, regulated steam.
    B,
    #[default]
    None,
}

impl FlowRegime {
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::None => "None",
        }
    }
}

/// Regime plus the flow-indicator level for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowReading {
    pub regime: FlowRegime,
    pub indicator_on: bool,
}

/// Inclusive rectangular band in (pressure, temperature) space.
#[derive(Debug, Clone, Copy)]
struct Band {
    pressure: (f32, f32),
    temperature: (f32, f32),
}

impl Band {
    fn contains(&self, pressure: f32, temperature: f32) -> bool {
        (self.pressure.0..=self.pressure.1).contains(&pressure)
            && (self.temperature.0..=self.temperature.1).contains(&temperature)
    }
}

const REGIME_A: Band = Band {
    pressure: (310.0, 350.0),
    temperature: (140.0, 160.0),
};

const REGIME_B: Band = Band {
    pressure: (260.0, 300.0),
    temperature: (160.0, 170.0),
};

/// Half-period of the regime-A blink.
pub const BLINK_HALF_PERIOD_MS: u64 = 100;

/// Classify the operating point.  `now_ms` only drives the A blink phase.
pub fn classify(pressure: f32, temperature: f32, now_ms: u64) -> FlowReading {
    if REGIME_A.contains(pressure, temperature) {
        FlowReading {
            regime: FlowRegime::A,
            indicator_on: (now_ms / BLINK_HALF_PERIOD_MS) % 2 == 0,
        }
    } else if REGIME_B.contains(pressure, temperature) {
        FlowReading {
            regime: FlowRegime::B,
            indicator_on: true,
        }
    } else {
        FlowReading::default()
    }
}
