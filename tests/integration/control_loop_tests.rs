//! Normal-operation behaviour of the ControlLoop: standby, operator input,
//! safety overrides, flow classification and telemetry cadence.

use super::mock_hw::{ActuatorCall, Rig};

use vaporsur::app::events::AppEvent;
use vaporsur::config::SystemConfig;
use vaporsur::context::Mode;
use vaporsur::drivers::button::PinLevel;
use vaporsur::drivers::led_patterns::{
    COLOUR_MODE_TEMPERATURE, COLOUR_NORMAL, COLOUR_OVERRIDE, COLOUR_WARNING,
};
use vaporsur::esd::EsdState;
use vaporsur::flow::FlowRegime;
use vaporsur::safety::OverrideKind;

// ── Startup ──────────────────────────────────────────────────

#[test]
fn standby_keeps_outputs_off() {
    let mut rig = Rig::with_config(SystemConfig::default());
    rig.set_process(470.0, 150.0);

    // 0 ..= 2990 ms
    for _ in 0..300 {
        let report = rig.tick();
        assert!(!report.engaged);
        assert_eq!(report.esd, EsdState::Running);
    }
    assert_eq!(rig.hw.calls, vec![ActuatorCall::AllOff]);
    assert!(rig.telemetry.lines.is_empty());
    assert!(!rig.app.is_engaged());

    // 3000 ms: engaged, and the overpressure trips immediately.
    let report = rig.tick();
    assert!(report.engaged);
    assert_eq!(report.esd, EsdState::Active);
    assert_eq!(rig.telemetry.lines.len(), 1);
    assert_eq!(rig.events.count(|e| *e == AppEvent::ControlEngaged), 1);
}

#[test]
fn start_emits_started_event() {
    let rig = Rig::with_config(SystemConfig::default());
    assert_eq!(
        rig.events.events.first(),
        Some(&AppEvent::Started { standby_ms: 3000 })
    );
}

#[test]
fn nominal_telemetry_line() {
    let mut rig = Rig::engaged();
    rig.tick();
    assert_eq!(
        rig.telemetry.lines[0],
        "P:300.0,T:150.0,MV:50.0,SH:50.0,F:None,M:PRESION,ESD:Desactivado,\
         ESTADO:Normal,RELIEF:No,PURGE:No"
    );
    assert_eq!(rig.hw.colours().last(), Some(&COLOUR_NORMAL));
}

// ── Flow regimes ─────────────────────────────────────────────

#[test]
fn regime_a_blinks_indicator() {
    let mut rig = Rig::engaged();
    rig.set_process(330.0, 150.0);
    let report = rig.ticks(30);
    assert_eq!(report.flow.regime, FlowRegime::A);

    let history = rig.hw.flow_indicator_history();
    assert_eq!(history.len(), 30);
    // 100 ms on, 100 ms off at 10 ms per tick.
    assert!(history[..10].iter().all(|on| *on));
    assert!(history[10..20].iter().all(|on| !*on));
    assert!(history[20..].iter().all(|on| *on));
    assert!(rig.telemetry.lines[0].contains("F:A"));
}

#[test]
fn regime_b_indicator_is_solid() {
    let mut rig = Rig::engaged();
    rig.set_process(280.0, 165.0);
    let report = rig.ticks(30);
    assert_eq!(report.flow.regime, FlowRegime::B);
    assert!(rig.hw.flow_indicator_history().iter().all(|on| *on));
    assert!(rig.telemetry.lines[0].contains("F:B"));
}

#[test]
fn outside_both_regimes_indicator_off() {
    let mut rig = Rig::engaged();
    rig.set_process(355.0, 150.0);
    let report = rig.ticks(5);
    assert_eq!(report.flow.regime, FlowRegime::None);
    assert!(rig.hw.flow_indicator_history().iter().all(|on| !*on));
}

// ── Status ───────────────────────────────────────────────────

#[test]
fn pressure_warning_shown_in_pressure_mode() {
    let mut rig = Rig::engaged();
    rig.set_process(390.0, 175.0);
    let report = rig.tick();
    assert_eq!(report.status.label(), "Advertencia Presión Alta");
    assert_eq!(rig.hw.colours().last(), Some(&COLOUR_WARNING));
}

// ── Safety overrides ─────────────────────────────────────────

#[test]
fn recovery_override_forces_valve_closed() {
    let mut rig = Rig::engaged();
    rig.tick();
    rig.set_process(215.0, 150.0);
    let report = rig.tick();

    assert!(rig.app.overrides().pressure_recovery);
    assert_eq!(report.status.label(), "Recuperación Presión");
    assert_eq!(report.flow.regime, FlowRegime::None);
    assert_eq!(rig.hw.valve(), Some(0.0));
    assert_eq!(rig.hw.colours().last(), Some(&COLOUR_OVERRIDE));
    assert_eq!(
        rig.events.count(|e| matches!(
            e,
            AppEvent::OverrideChanged(c) if c.kind == OverrideKind::PressureRecovery && c.active
        )),
        1
    );

    // Encoder turns in pressure mode are discarded.
    rig.hw.input.encoder_position = 5;
    rig.tick();
    assert_eq!(rig.app.process().valve_percent, 0.0);
}

#[test]
fn recovery_releases_above_hysteresis_band() {
    let mut rig = Rig::engaged();
    rig.set_process(215.0, 150.0);
    rig.tick();
    assert!(rig.app.overrides().pressure_recovery);

    rig.set_process(235.0, 150.0);
    rig.tick();
    assert!(rig.app.overrides().pressure_recovery);

    rig.set_process(241.0, 150.0);
    let report = rig.tick();
    assert!(!rig.app.overrides().pressure_recovery);
    assert_eq!(report.status.label(), "Advertencia Presión Baja");
}

#[test]
fn both_overrides_reported_together() {
    let mut rig = Rig::engaged();
    rig.set_process(200.0, 100.0);
    let report = rig.tick();
    assert_eq!(
        report.status.label(),
        "Recuperación Presión y Precalentamiento"
    );
    assert_eq!(rig.hw.valve(), Some(0.0));
    assert_eq!(rig.hw.heater(), Some(100.0));
}

// ── Operator input ───────────────────────────────────────────

#[test]
fn encoder_moves_valve_in_pressure_mode() {
    let mut rig = Rig::engaged();
    rig.tick();
    rig.hw.input.encoder_position = 3;
    rig.tick();
    assert_eq!(rig.hw.valve(), Some(56.0));
    assert_eq!(rig.hw.heater(), Some(50.0));
}

#[test]
fn mode_button_toggles_once_per_press() {
    let mut rig = Rig::engaged();
    rig.tick();

    rig.mode_button(PinLevel::Low);
    rig.ticks(40);
    assert_eq!(rig.app.mode(), Mode::Temperature);
    assert_eq!(
        rig.events
            .count(|e| matches!(e, AppEvent::ModeChanged(Mode::Temperature))),
        1
    );
    assert!(rig.hw.colours().contains(&COLOUR_MODE_TEMPERATURE));

    rig.mode_button(PinLevel::High);
    rig.ticks(5);
    rig.hw.input.encoder_position = -4;
    rig.tick();
    assert_eq!(rig.app.process().heater_percent, 46.0);
    assert_eq!(rig.app.process().valve_percent, 50.0);
}

#[test]
fn mode_button_bounce_is_filtered() {
    let mut rig = Rig::engaged();
    rig.tick();
    for _ in 0..10 {
        rig.mode_button(PinLevel::Low);
        rig.ticks(5);
        rig.mode_button(PinLevel::High);
        rig.tick();
    }
    assert_eq!(rig.app.mode(), Mode::Pressure);
    assert_eq!(rig.events.count(|e| matches!(e, AppEvent::ModeChanged(_))), 0);
}

#[test]
fn failed_sample_holds_previous_input() {
    let mut rig = Rig::engaged();
    rig.tick();
    rig.hw.input.encoder_position = 3;
    rig.hw.input_fault = true;
    rig.tick();
    assert_eq!(rig.app.process().valve_percent, 50.0);
    assert_eq!(rig.app.held_samples(), 1);

    rig.hw.input_fault = false;
    rig.tick();
    assert_eq!(rig.app.process().valve_percent, 56.0);
}

// ── Telemetry ────────────────────────────────────────────────

#[test]
fn telemetry_emitted_every_100_ms() {
    let mut rig = Rig::engaged();
    let mut published = 0;
    for _ in 0..100 {
        if rig.tick().telemetry.is_some() {
            published += 1;
        }
    }
    assert_eq!(published, 10);
    assert_eq!(rig.telemetry.lines.len(), 10);
}

#[test]
fn telemetry_failure_is_counted_not_fatal() {
    let mut rig = Rig::engaged();
    rig.telemetry.fail = true;
    rig.ticks(20);
    assert_eq!(rig.app.telemetry_failures(), 2);
    assert_eq!(rig.app.esd_state(), EsdState::Running);
    assert_eq!(
        rig.events.count(|e| matches!(e, AppEvent::TelemetryFault(_))),
        2
    );

    rig.telemetry.fail = false;
    rig.ticks(10);
    assert_eq!(rig.telemetry.lines.len(), 1);
}
