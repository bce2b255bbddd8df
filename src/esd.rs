//! Emergency Shutdown (ESD) sequencer.
//!
//! ```text
//!            [P >= 460 | T >= 190 | operator press | actuator fault]
//!  RUNNING ──────────────────────────────────────────────────────▶ ACTIVE
//!     ▲                                                              │
//!     │                                   [|P-300| <= 5 && |T-150| <= 3]
//!     │                                                              ▼
//!     └──────────────────[operator press]────────────────── READY_FOR_RESET
//! ```
//!
//! No other transitions exist.  While `Active` or `ReadyForReset` the
//! sequencer owns both channels and runs the return-to-nominal control
//! law every tick; the safety overrides and operator input are shut out.
//!
//! The state itself lives in [`ControlContext::esd`]; the sequencer
//! holds only the time the current state was entered.

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::context::ControlContext;
use crate::process::NEUTRAL_PERCENT;
use crate::safety::SafetyOverride;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EsdState {
    /// Normal operation: overrides and operator input apply.
    #[default]
    Running,
    /// Tripped: the control law drives both channels toward nominal.
    Active,
    /// Converged: waiting for operator acknowledgment.
    ReadyForReset,
}

impl EsdState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Active => "Active",
            Self::ReadyForReset => "ReadyForReset",
        }
    }
}

/// Why the sequencer left `Running`, or that an operator reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsdTrigger {
    /// Pressure reached the trip limit.
    PressureHigh,
    /// Temperature reached the trip limit.
    TemperatureHigh,
    /// Debounced ESD button press.
    Operator,
    /// An actuator write failed while running.
    ActuatorFault,
    /// Both quantities returned inside tolerance.
    Converged,
}

impl core::fmt::Display for EsdTrigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PressureHigh => write!(f, "pressure trip"),
            Self::TemperatureHigh => write!(f, "temperature trip"),
            Self::Operator => write!(f, "operator"),
            Self::ActuatorFault => write!(f, "actuator fault"),
            Self::Converged => write!(f, "converged"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsdTransition {
    pub from: EsdState,
    pub to: EsdState,
    pub trigger: EsdTrigger,
}

// ---------------------------------------------------------------------------
// Control-law output
// ---------------------------------------------------------------------------

/// What the control law did to one channel this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Above nominal: venting/purging with accelerated decay.
    Reducing,
    /// Below nominal: channel driven to raise the quantity.
    Raising,
    /// Inside tolerance: channel at neutral.
    Holding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsdCorrection {
    pub pressure: Correction,
    pub temperature: Correction,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

pub struct EsdSequencer {
    /// Tick time at which the current state was entered.
    entered_at_ms: u64,
}

impl EsdSequencer {
    pub fn new() -> Self {
        Self { entered_at_ms: 0 }
    }

    /// Evaluate trip conditions and operator presses against the current
    /// process values.
    ///
    /// Trip conditions are checked before the operator press, so an
    /// automatic trip is always reported as such.  A press while `Active`,
    /// or any trip condition outside `Running`, is ignored.
    pub fn evaluate(
        &mut self,
        ctx: &mut ControlContext,
        operator_press: bool,
        actuator_fault: bool,
    ) -> Option<EsdTransition> {
        match ctx.esd {
            EsdState::Running => {
                let trigger = Self::trip_trigger(ctx, operator_press, actuator_fault)?;
                SafetyOverride::clear(ctx);
                Some(self.transition(ctx, EsdState::Active, trigger))
            }
            EsdState::ReadyForReset if operator_press => {
                SafetyOverride::clear(ctx);
                Some(self.transition(ctx, EsdState::Running, EsdTrigger::Operator))
            }
            EsdState::Active | EsdState::ReadyForReset => None,
        }
    }

    /// Run one step of the return-to-nominal control law.  No-op while
    /// `Running`.
    ///
    /// Per channel: outside tolerance and above nominal, open the relief
    /// (purge) output, park the channel at neutral and apply accelerated
    /// decay; outside tolerance and below nominal, drive the channel to
    /// raise the quantity; inside tolerance, park at neutral.  The normal
    /// process response is then applied on top.  Convergence is checked
    /// on the resulting values.
    pub fn control(&mut self, ctx: &mut ControlContext) -> Option<EsdTransition> {
        if ctx.esd == EsdState::Running {
            return None;
        }

        let cfg = &ctx.config;
        let dt = ctx.dt_secs;
        let nominal_p = cfg.nominal_pressure_kpa;
        let nominal_t = cfg.nominal_temperature_c;
        let tol_p = cfg.esd_pressure_tolerance_kpa;
        let tol_t = cfg.esd_temperature_tolerance_c;
        let decay = cfg.esd_decay_gain;
        let gain = cfg.response_gain;

        // ── Pressure ──────────────────────────────────────────────
        let p = ctx.process.pressure;
        let pressure = if (p - nominal_p).abs() > tol_p {
            if p > nominal_p {
                ctx.process.set_valve(NEUTRAL_PERCENT);
                ctx.process.vent_toward(nominal_p, dt, decay);
                Correction::Reducing
            } else {
                ctx.process.set_valve(0.0);
                Correction::Raising
            }
        } else {
            ctx.process.set_valve(NEUTRAL_PERCENT);
            Correction::Holding
        };

        // ── Temperature ───────────────────────────────────────────
        let t = ctx.process.temperature;
        let temperature = if (t - nominal_t).abs() > tol_t {
            if t > nominal_t {
                ctx.process.set_heater(NEUTRAL_PERCENT);
                ctx.process.purge_toward(nominal_t, dt, decay);
                Correction::Reducing
            } else {
                ctx.process.set_heater(100.0);
                Correction::Raising
            }
        } else {
            ctx.process.set_heater(NEUTRAL_PERCENT);
            Correction::Holding
        };

        let venting = pressure == Correction::Reducing;
        let purging = temperature == Correction::Reducing;
        ctx.process.respond(dt, gain, venting, purging);

        ctx.outputs.commands.relief_open = venting;
        ctx.outputs.commands.purge_open = purging;
        ctx.outputs.esd_correction = Some(EsdCorrection {
            pressure,
            temperature,
        });

        if ctx.esd == EsdState::Active && Self::converged(ctx) {
            return Some(self.transition(ctx, EsdState::ReadyForReset, EsdTrigger::Converged));
        }
        None
    }

    /// Milliseconds spent in the current state as of `now_ms`.
    fn ms_in_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_at_ms)
    }

    /// Both quantities inside their tolerance windows.
    pub fn converged(ctx: &ControlContext) -> bool {
        let cfg = &ctx.config;
        (ctx.process.pressure - cfg.nominal_pressure_kpa).abs() <= cfg.esd_pressure_tolerance_kpa
            && (ctx.process.temperature - cfg.nominal_temperature_c).abs()
                <= cfg.esd_temperature_tolerance_c
    }

    // ── Internal ──────────────────────────────────────────────────

    fn trip_trigger(
        ctx: &ControlContext,
        operator_press: bool,
        actuator_fault: bool,
    ) -> Option<EsdTrigger> {
        let cfg = &ctx.config;
        if ctx.process.pressure >= cfg.pressure_emergency_kpa {
            Some(EsdTrigger::PressureHigh)
        } else if ctx.process.temperature >= cfg.temperature_emergency_c {
            Some(EsdTrigger::TemperatureHigh)
        } else if actuator_fault {
            Some(EsdTrigger::ActuatorFault)
        } else if operator_press {
            Some(EsdTrigger::Operator)
        } else {
            None
        }
    }

    fn transition(&mut self, ctx: &mut ControlContext, to: EsdState, trigger: EsdTrigger) -> EsdTransition {
        let from = ctx.esd;
        match to {
            EsdState::Active => error!(
                "ESD transition: {} -> {} ({trigger}) P={:.1} T={:.1}",
                from.name(),
                to.name(),
                ctx.process.pressure,
                ctx.process.temperature
            ),
            _ => info!(
                "ESD transition: {} -> {} ({trigger}) after {} ms",
                from.name(),
                to.name(),
                self.ms_in_state(ctx.now_ms)
            ),
        }
        ctx.esd = to;
        self.entered_at_ms = ctx.now_ms;
        EsdTransition { from, to, trigger }
    }
}

impl Default for EsdSequencer {
    fn default() -> Self {
        Self::new()
    }
}
