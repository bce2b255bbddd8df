//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns the control context and every stateful control
//! component.  All I/O flows through port traits injected at call sites,
//! making the whole loop testable with mock adapters.
//!
//! ```text
//!     InputPort ──▶ ┌──────────────────────────────┐ ──▶ TelemetrySink
//!                   │          ControlLoop          │
//!  ActuatorPort ◀── │ ESD · Safety · Setpoint · Flow│ ──▶ EventSink
//!                   └──────────────────────────────┘
//! ```
//!
//! ## Tick order
//!
//! 1. sample inputs (hold the previous sample on error)
//! 2. evaluate ESD trip / operator press
//! 3. Running: mode toggle, safety overrides, setpoint, process response,
//!    flow classification
//! 4. Active / ReadyForReset: ESD control law, flow forced to None
//! 5. status classification and indicator
//! 6. actuator writes
//! 7. telemetry, when the emission interval has elapsed
//!
//! The clock is sampled once per tick by the caller; every
//! time-dependent decision in the tick uses that one value.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::context::{ControlContext, Mode, OverrideLatches};
use crate::drivers::actuator::ActuatorDriver;
use crate::drivers::button::DebouncedButton;
use crate::drivers::led_patterns::{LedPatternEngine, PatternRequest};
use crate::error::ActuatorError;
use crate::esd::{EsdSequencer, EsdState, EsdTransition};
use crate::flow::{self, FlowReading};
use crate::process::ProcessState;
use crate::safety::SafetyOverride;
use crate::setpoint::{Adjustment, SetpointInput};
use crate::status::SystemStatus;
use crate::telemetry::{EmissionGate, TelemetryRecord};

use super::events::AppEvent;
use super::ports::{
    ActuatorPort, ClockPort, EventSink, InputPort, InputSample, TelemetrySink,
};

// ───────────────────────────────────────────────────────────────
// Tick report
// ───────────────────────────────────────────────────────────────

/// Summary of one tick, returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub now_ms: u64,
    /// False during the startup standby period.
    pub engaged: bool,
    pub esd: EsdState,
    pub status: SystemStatus,
    pub flow: FlowReading,
    /// Last ESD transition taken this tick, if any.  A trip that
    /// converges within the same tick reports the convergence.
    pub transition: Option<EsdTransition>,
    /// Record published this tick, if the emission gate opened and the
    /// sink accepted it.
    pub telemetry: Option<TelemetryRecord>,
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    ctx: ControlContext,
    safety: SafetyOverride,
    esd: EsdSequencer,
    setpoint: SetpointInput,
    /// Same debounce policy as the mode button; one trip or reset per press.
    esd_button: DebouncedButton,
    leds: LedPatternEngine,
    actuators: ActuatorDriver,
    telemetry_gate: EmissionGate,
    /// Last valid input sample; held when a sample read fails.
    last_sample: InputSample,
    started_at_ms: Option<u64>,
    last_tick_ms: Option<u64>,
    engaged: bool,
    /// Actuator failure seen while running; trips the ESD next tick.
    pending_fault: Option<ActuatorError>,
    tick_count: u64,
    held_samples: u32,
    telemetry_failures: u32,
}

impl ControlLoop {
    /// Construct the loop from configuration.
    ///
    /// Does **not** touch any output; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let safety = SafetyOverride::new(&config);
        let setpoint = SetpointInput::new(&config);
        let leds = LedPatternEngine::new(config.mode_flash_cycles);
        let telemetry_gate = EmissionGate::new(config.telemetry_interval_ms);
        let esd_button = DebouncedButton::new(config.debounce_ms);
        Self {
            ctx: ControlContext::new(config),
            safety,
            esd: EsdSequencer::new(),
            setpoint,
            esd_button,
            leds,
            actuators: ActuatorDriver::new(),
            telemetry_gate,
            last_sample: InputSample::IDLE,
            started_at_ms: None,
            last_tick_ms: None,
            engaged: false,
            pending_fault: None,
            tick_count: 0,
            held_samples: 0,
            telemetry_failures: 0,
        }
    }

    /// Validate `config`, then construct the loop.
    pub fn try_new(config: SystemConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output off and begin the standby period at `now_ms`.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if let Err(e) = self.actuators.all_off(hw) {
            sink.emit(&AppEvent::ActuatorFault(e));
        }
        self.started_at_ms = Some(now_ms);
        self.last_tick_ms = Some(now_ms);
        let standby_ms = self.ctx.config.standby_ms;
        sink.emit(&AppEvent::Started { standby_ms });
        info!("ControlLoop started, standby {} ms", standby_ms);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle at `now_ms`.
    ///
    /// The `hw` parameter satisfies **both** [`InputPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl InputPort + ActuatorPort),
        telemetry: &mut impl TelemetrySink,
        sink: &mut impl EventSink,
    ) -> TickReport {
        self.tick_count += 1;
        let started_at = *self.started_at_ms.get_or_insert(now_ms);
        let elapsed_ms = self
            .last_tick_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_tick_ms = Some(now_ms);
        let dt_secs = elapsed_ms as f32 / 1000.0 * self.ctx.config.time_scale;

        // 1. Sample inputs via InputPort
        match hw.sample() {
            Ok(sample) => self.last_sample = sample,
            Err(e) => {
                self.held_samples = self.held_samples.saturating_add(1);
                warn!("Input sample failed ({}), holding previous sample", e);
            }
        }
        let sample = self.last_sample;

        if !self.engaged {
            if now_ms.saturating_sub(started_at) < u64::from(self.ctx.config.standby_ms) {
                return self.standby_report(now_ms);
            }
            self.engaged = true;
            sink.emit(&AppEvent::ControlEngaged);
            info!("Standby complete, control engaged");
        }

        self.ctx.begin_tick(now_ms, dt_secs);

        let delta = self.setpoint.read_delta(sample.encoder_position);
        let toggle = self.setpoint.read_mode_toggle(now_ms, sample.mode_button);
        let esd_press = self.esd_button.tick(now_ms, sample.esd_button);

        // 2. ESD trip / reset
        let fault = self.pending_fault.take();
        let mut transition = self.esd.evaluate(&mut self.ctx, esd_press, fault.is_some());
        if let Some(t) = transition {
            sink.emit(&AppEvent::EsdTransition(t));
        }

        // 3 / 4. Running logic or ESD control law
        if self.ctx.esd_engaged() {
            if let Some(t) = self.esd.control(&mut self.ctx) {
                sink.emit(&AppEvent::EsdTransition(t));
                transition = Some(t);
            }
        } else {
            self.running_step(delta, toggle, sink);
        }

        let cmds = &mut self.ctx.outputs.commands;
        cmds.laser = cmds.relief_open || cmds.purge_open;

        // 5. Status and indicator
        let status = SystemStatus::classify(&self.ctx);
        self.ctx.outputs.status = status;
        let (colour, pattern) = status.indicator();
        if status.is_esd() {
            self.leds.set_esd_pattern(Some(PatternRequest { colour, pattern }));
        } else {
            self.leds.set_esd_pattern(None);
            self.leds.set_status_pattern(colour, pattern);
        }
        self.ctx.outputs.commands.status_rgb = self.leds.tick(now_ms);

        // 6. Actuators via ActuatorPort
        if let Err(e) = self.actuators.apply(&self.ctx, hw) {
            sink.emit(&AppEvent::ActuatorFault(e));
            if self.ctx.esd == EsdState::Running {
                self.pending_fault = Some(e);
            }
        }

        // 7. Telemetry
        let telemetry = self.publish_telemetry(now_ms, telemetry, sink);

        debug!(
            "tick {} P={:.1} T={:.1} MV={:.1} SH={:.1} esd={} status={}",
            self.tick_count,
            self.ctx.process.pressure,
            self.ctx.process.temperature,
            self.ctx.process.valve_percent,
            self.ctx.process.heater_percent,
            self.ctx.esd.name(),
            status.label()
        );

        TickReport {
            now_ms,
            engaged: true,
            esd: self.ctx.esd,
            status,
            flow: self.ctx.outputs.flow,
            transition,
            telemetry,
        }
    }

    /// Fixed-period loop: start, then tick every
    /// `control_loop_interval_ms` until `keep_running` returns false.
    /// Outputs are driven off before returning.
    pub fn run<H, T, S>(
        &mut self,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
        hw: &mut H,
        telemetry: &mut T,
        sink: &mut S,
        mut keep_running: impl FnMut(&TickReport) -> bool,
    ) where
        H: InputPort + ActuatorPort,
        T: TelemetrySink,
        S: EventSink,
    {
        self.start(clock.now_ms(), hw, sink);
        let interval_ms = self.ctx.config.control_loop_interval_ms;
        loop {
            let report = self.tick(clock.now_ms(), hw, telemetry, sink);
            if !keep_running(&report) {
                break;
            }
            delay.delay_ms(interval_ms);
        }
        if let Err(e) = self.actuators.all_off(hw) {
            sink.emit(&AppEvent::ActuatorFault(e));
        }
        info!("ControlLoop stopped after {} ticks", self.tick_count);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    pub fn esd_state(&self) -> EsdState {
        self.ctx.esd
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    pub fn overrides(&self) -> OverrideLatches {
        self.ctx.overrides
    }

    pub fn process(&self) -> &ProcessState {
        &self.ctx.process
    }

    /// Direct plant access for simulation and test setup.
    pub fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.ctx.process
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    /// True once the standby period has elapsed.
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Total ticks executed since construction, standby included.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks that ran on a held input sample.
    pub fn held_samples(&self) -> u32 {
        self.held_samples
    }

    /// Telemetry records that failed to encode or send.
    pub fn telemetry_failures(&self) -> u32 {
        self.telemetry_failures
    }

    /// Failed actuator writes since construction.
    pub fn actuator_failures(&self) -> u32 {
        self.actuators.write_failures()
    }

    // ── Internal ──────────────────────────────────────────────

    fn standby_report(&self, now_ms: u64) -> TickReport {
        TickReport {
            now_ms,
            engaged: false,
            esd: self.ctx.esd,
            status: SystemStatus::default(),
            flow: FlowReading::default(),
            transition: None,
            telemetry: None,
        }
    }

    /// Normal operation: mode, overrides, setpoint, plant, flow.
    fn running_step(&mut self, delta: i32, toggle: bool, sink: &mut impl EventSink) {
        let ctx = &mut self.ctx;

        if toggle {
            ctx.mode = ctx.mode.toggled();
            self.leds.start_mode_flash(ctx.mode, ctx.now_ms);
            sink.emit(&AppEvent::ModeChanged(ctx.mode));
            info!("Mode changed to {}", ctx.mode.label());
        }

        for change in self.safety.supervise(ctx) {
            sink.emit(&AppEvent::OverrideChanged(change));
        }
        self.safety.apply(ctx);

        if self.setpoint.apply(ctx, delta) == Adjustment::Ignored {
            debug!("Encoder input ignored ({} detents), channel overridden", delta);
        }

        let gain = ctx.config.response_gain;
        ctx.process.respond(ctx.dt_secs, gain, false, false);

        let reading = if ctx.overrides.any() {
            FlowReading::default()
        } else {
            flow::classify(ctx.process.pressure, ctx.process.temperature, ctx.now_ms)
        };
        ctx.outputs.flow = reading;
        ctx.outputs.commands.flow_indicator = reading.indicator_on;
    }

    fn publish_telemetry(
        &mut self,
        now_ms: u64,
        telemetry: &mut impl TelemetrySink,
        sink: &mut impl EventSink,
    ) -> Option<TelemetryRecord> {
        if !self.telemetry_gate.due(now_ms) {
            return None;
        }
        let record = TelemetryRecord::capture(&self.ctx);
        match telemetry.publish(&record) {
            Ok(()) => Some(record),
            Err(e) => {
                self.telemetry_failures = self.telemetry_failures.saturating_add(1);
                warn!(
                    "Telemetry emission failed: {} ({} total)",
                    e, self.telemetry_failures
                );
                sink.emit(&AppEvent::TelemetryFault(e));
                None
            }
        }
    }
}
