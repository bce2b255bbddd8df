//! Polled push-button conditioning: debounced press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switches with pull-ups: electrically low means
//! pressed.  Each conditioner is fed one [`PinLevel`] sample per control
//! tick together with that tick's single time sample.
//!
//! ## Debounce policy
//!
//! | From       | Input                      | To         | Reports |
//! |------------|----------------------------|------------|---------|
//! | Released   | low                        | Settling   | -       |
//! | Settling   | high                       | Released   | -       |
//! | Settling   | low, held >= debounce      | Latched    | press   |
//! | Latched    | high                       | Released   | -       |
//!
//! A press is reported once; the conditioner re-arms only on release.

use serde::{Deserialize, Serialize};

/// Electrical level of an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinLevel {
    High,
    Low,
}

impl PinLevel {
    /// Logical "pressed" for an active-low switch.
    pub fn is_pressed(self) -> bool {
        self == Self::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Released,
    Settling { since_ms: u64 },
    Latched,
}

/// Debounced active-low push button.
pub struct DebouncedButton {
    debounce_ms: u64,
    state: DebounceState,
}

impl DebouncedButton {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms: u64::from(debounce_ms),
            state: DebounceState::Released,
        }
    }

    /// Call once per control tick with the sampled level.
    /// Returns `true` exactly once per debounced press.
    pub fn tick(&mut self, now_ms: u64, level: PinLevel) -> bool {
        match (self.state, level.is_pressed()) {
            (DebounceState::Released, true) => {
                self.state = DebounceState::Settling { since_ms: now_ms };
                self.settle(now_ms, now_ms)
            }
            (DebounceState::Settling { since_ms }, true) => self.settle(since_ms, now_ms),
            (_, false) => {
                self.state = DebounceState::Released;
                false
            }
            (DebounceState::Latched, true) => false,
        }
    }

    fn settle(&mut self, since_ms: u64, now_ms: u64) -> bool {
        if now_ms.saturating_sub(since_ms) >= self.debounce_ms {
            self.state = DebounceState::Latched;
            true
        } else {
            false
        }
    }
}
