//! Safety override supervisor.
//!
//! Two independent hysteresis latches protect the process against
//! running too cold or too depressurised:
//!
//! | Latch    | Engages when            | Releases when                 | Forces          |
//! |----------|-------------------------|-------------------------------|-----------------|
//! | recovery | `pressure <= 220`       | `pressure > 220 + 20`         | valve = 0 %     |
//! | preheat  | `temperature <= 110`    | `temperature > 110 + 20`      | heater = 100 %  |
//!
//! The latches live in [`ControlContext`]; the supervisor only holds the
//! thresholds.  It runs only while the ESD is `Running`; a trip or a reset
//! clears both latches through [`SafetyOverride::clear`].

use log::{info, warn};

use crate::config::SystemConfig;
use crate::context::{ControlContext, OverrideLatches};

/// Which override a latch change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    PressureRecovery,
    Preheat,
}

impl core::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PressureRecovery => write!(f, "pressure recovery"),
            Self::Preheat => write!(f, "preheat"),
        }
    }
}

/// A latch that changed during [`SafetyOverride::supervise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideChange {
    pub kind: OverrideKind,
    pub active: bool,
}

/// Safety override supervisor.
pub struct SafetyOverride {
    recovery_enter_kpa: f32,
    recovery_exit_kpa: f32,
    preheat_enter_c: f32,
    preheat_exit_c: f32,
}

/// Valve opening forced while recovery is latched.
pub const RECOVERY_VALVE_PERCENT: f32 = 0.0;
/// Heater power forced while preheat is latched.
pub const PREHEAT_HEATER_PERCENT: f32 = 100.0;

impl SafetyOverride {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            recovery_enter_kpa: config.recovery_threshold_kpa,
            recovery_exit_kpa: config.recovery_threshold_kpa + config.override_hysteresis,
            preheat_enter_c: config.preheat_threshold_c,
            preheat_exit_c: config.preheat_threshold_c + config.override_hysteresis,
        }
    }

    /// Advance both latches against the current process values.
    ///
    /// Pure apart from the previous latch state: the same `(latches,
    /// pressure, temperature)` always produces the same result.
    pub fn evaluate(&self, latches: OverrideLatches, pressure: f32, temperature: f32) -> OverrideLatches {
        OverrideLatches {
            pressure_recovery: Self::latch(
                latches.pressure_recovery,
                pressure <= self.recovery_enter_kpa,
                pressure > self.recovery_exit_kpa,
            ),
            preheat: Self::latch(
                latches.preheat,
                temperature <= self.preheat_enter_c,
                temperature > self.preheat_exit_c,
            ),
        }
    }

    /// Evaluate against the context and store the new latches.  Returns
    /// the latches that changed.
    pub fn supervise(&self, ctx: &mut ControlContext) -> heapless::Vec<OverrideChange, 2> {
        let before = ctx.overrides;
        let after = self.evaluate(before, ctx.process.pressure, ctx.process.temperature);
        ctx.overrides = after;

        let mut changes = heapless::Vec::new();
        if before.pressure_recovery != after.pressure_recovery {
            Self::log_change(OverrideKind::PressureRecovery, after.pressure_recovery);
            let _ = changes.push(OverrideChange {
                kind: OverrideKind::PressureRecovery,
                active: after.pressure_recovery,
            });
        }
        if before.preheat != after.preheat {
            Self::log_change(OverrideKind::Preheat, after.preheat);
            let _ = changes.push(OverrideChange {
                kind: OverrideKind::Preheat,
                active: after.preheat,
            });
        }
        changes
    }

    /// Force the channel of every active latch.
    pub fn apply(&self, ctx: &mut ControlContext) {
        if ctx.overrides.pressure_recovery {
            ctx.process.set_valve(RECOVERY_VALVE_PERCENT);
        }
        if ctx.overrides.preheat {
            ctx.process.set_heater(PREHEAT_HEATER_PERCENT);
        }
    }

    /// Drop both latches (ESD trip or reset).
    pub fn clear(ctx: &mut ControlContext) {
        if ctx.overrides.any() {
            info!("Safety overrides cleared");
        }
        ctx.overrides = OverrideLatches::default();
    }

    // ── Internal ──────────────────────────────────────────────────

    fn latch(active: bool, enter: bool, exit: bool) -> bool {
        if active { !exit } else { enter }
    }

    fn log_change(kind: OverrideKind, active: bool) {
        if active {
            warn!("SAFETY OVERRIDE SET: {kind}");
        } else {
            info!("SAFETY OVERRIDE CLEARED: {kind}");
        }
    }
}
