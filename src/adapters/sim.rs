//! Simulated operator panel.
//!
//! Implements [`InputPort`] and [`ActuatorPort`] without hardware: the
//! operator is a time-ordered script of encoder turns and button presses,
//! and every actuator write is recorded for inspection.  Used by the host
//! binary and by tests; it is a drop-in replacement for the GPIO panel.
//!
//! [`SimClock`] and [`SimDelay`] provide simulated time, so a scripted
//! run completes as fast as the host can tick.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::{ActuatorPort, ClockPort, InputPort, InputSample};
use crate::drivers::button::PinLevel;
use crate::error::{ActuatorError, InputError};

// ── Simulated time ────────────────────────────────────────────

/// Manually advanced millisecond clock.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: Cell<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.set(ms);
    }
}

impl ClockPort for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// `DelayNs` that advances a [`SimClock`] instead of sleeping.
pub struct SimDelay<'a> {
    clock: &'a SimClock,
    /// Sub-millisecond remainder carried between calls.
    carry_ns: u64,
}

impl<'a> SimDelay<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self { clock, carry_ns: 0 }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let total = self.carry_ns + u64::from(ns);
        self.clock.advance(total / 1_000_000);
        self.carry_ns = total % 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(u64::from(ms));
    }
}

// ── Operator script ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorAction {
    /// Rotate the encoder by this many detents (signed).
    Turn(i32),
    /// Press and hold the encoder button.
    PressMode,
    /// Press and hold the ESD button.
    PressEsd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedAction {
    pub at_ms: u64,
    pub action: OperatorAction,
}

impl ScriptedAction {
    pub fn new(at_ms: u64, action: OperatorAction) -> Self {
        Self { at_ms, action }
    }
}

/// How long a scripted press holds the button low.  Longer than the
/// default debounce window.
pub const DEFAULT_PRESS_HOLD_MS: u64 = 200;

// ── Recorded outputs ──────────────────────────────────────────

/// Last value written to each output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelOutputs {
    pub valve_percent: f32,
    pub heater_percent: f32,
    pub relief: bool,
    pub purge: bool,
    pub flow_indicator: bool,
    pub laser: bool,
    pub rgb: (u8, u8, u8),
}

// ── Panel ─────────────────────────────────────────────────────

pub struct SimulatedPanel<C: ClockPort> {
    clock: C,
    script: Vec<ScriptedAction>,
    next_action: usize,
    press_hold_ms: u64,
    position: i32,
    mode_release_at: Option<u64>,
    esd_release_at: Option<u64>,
    outputs: PanelOutputs,
    writes: u64,
    input_faults: u32,
    actuator_faults: u32,
}

impl<C: ClockPort> SimulatedPanel<C> {
    /// Panel driven by `script`; actions are sorted by time.
    pub fn new(clock: C, mut script: Vec<ScriptedAction>) -> Self {
        script.sort_by_key(|a| a.at_ms);
        Self {
            clock,
            script,
            next_action: 0,
            press_hold_ms: DEFAULT_PRESS_HOLD_MS,
            position: 0,
            mode_release_at: None,
            esd_release_at: None,
            outputs: PanelOutputs::default(),
            writes: 0,
            input_faults: 0,
            actuator_faults: 0,
        }
    }

    /// How long each scripted press holds its button low.  Holds shorter
    /// than the controller's debounce window never register.
    pub fn with_press_hold(mut self, ms: u64) -> Self {
        self.press_hold_ms = ms;
        self
    }

    /// Fail the next `count` input samples.
    pub fn inject_input_faults(&mut self, count: u32) {
        self.input_faults = count;
    }

    /// Fail the next `count` actuator writes.
    pub fn inject_actuator_faults(&mut self, count: u32) {
        self.actuator_faults = count;
    }

    pub fn outputs(&self) -> PanelOutputs {
        self.outputs
    }

    /// Total successful actuator writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// True once every scripted action has been performed.
    pub fn script_done(&self) -> bool {
        self.next_action >= self.script.len()
    }

    fn perform_due(&mut self, now_ms: u64) {
        while let Some(step) = self.script.get(self.next_action).copied() {
            if step.at_ms > now_ms {
                break;
            }
            debug!("sim operator @{}ms: {:?}", step.at_ms, step.action);
            let release = step.at_ms.saturating_add(self.press_hold_ms);
            match step.action {
                OperatorAction::Turn(detents) => {
                    self.position = self.position.wrapping_add(detents);
                }
                OperatorAction::PressMode => self.mode_release_at = Some(release),
                OperatorAction::PressEsd => self.esd_release_at = Some(release),
            }
            self.next_action += 1;
        }
    }

    fn level(release_at: Option<u64>, now_ms: u64) -> PinLevel {
        match release_at {
            Some(at) if now_ms < at => PinLevel::Low,
            _ => PinLevel::High,
        }
    }

    fn write(&mut self, apply: impl FnOnce(&mut PanelOutputs)) -> Result<(), ActuatorError> {
        if self.actuator_faults > 0 {
            self.actuator_faults -= 1;
            return Err(ActuatorError::GpioWriteFailed);
        }
        apply(&mut self.outputs);
        self.writes += 1;
        Ok(())
    }
}

impl<C: ClockPort> InputPort for SimulatedPanel<C> {
    fn sample(&mut self) -> Result<InputSample, InputError> {
        let now_ms = self.clock.now_ms();
        self.perform_due(now_ms);
        if self.input_faults > 0 {
            self.input_faults -= 1;
            return Err(InputError::Unavailable);
        }
        Ok(InputSample {
            encoder_position: self.position,
            mode_button: Self::level(self.mode_release_at, now_ms),
            esd_button: Self::level(self.esd_release_at, now_ms),
        })
    }
}

impl<C: ClockPort> ActuatorPort for SimulatedPanel<C> {
    fn set_valve(&mut self, percent: f32) -> Result<(), ActuatorError> {
        self.write(|o| o.valve_percent = percent)
    }

    fn set_heater(&mut self, percent: f32) -> Result<(), ActuatorError> {
        self.write(|o| o.heater_percent = percent)
    }

    fn set_relief(&mut self, open: bool) -> Result<(), ActuatorError> {
        self.write(|o| o.relief = open)
    }

    fn set_purge(&mut self, open: bool) -> Result<(), ActuatorError> {
        self.write(|o| o.purge = open)
    }

    fn set_flow_indicator(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.write(|o| o.flow_indicator = on)
    }

    fn set_laser(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.write(|o| o.laser = on)
    }

    fn set_status_colour(&mut self, r: u8, g: u8, b: u8) -> Result<(), ActuatorError> {
        self.write(|o| o.rgb = (r, g, b))
    }

    fn all_off(&mut self) -> Result<(), ActuatorError> {
        self.write(|o| *o = PanelOutputs::default())
    }
}
