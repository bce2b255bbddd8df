//! Scripted operator sessions on the simulated panel, driven through
//! `ControlLoop::run` on simulated time.

use super::mock_hw::{EventLog, LineRecorder};

use vaporsur::adapters::sim::{
    OperatorAction, ScriptedAction, SimClock, SimDelay, SimulatedPanel,
};
use vaporsur::app::events::AppEvent;
use vaporsur::app::ports::ClockPort;
use vaporsur::config::SystemConfig;
use vaporsur::context::Mode;
use vaporsur::esd::{EsdState, EsdTrigger};
use vaporsur::{ControlLoop, TickReport};

fn triggers(events: &EventLog) -> Vec<EsdTrigger> {
    events
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::EsdTransition(t) => Some(t.trigger),
            _ => None,
        })
        .collect()
}

/// Run a default-config loop against `script` until `until_ms`.
fn run_script(
    control: &mut ControlLoop,
    script: Vec<ScriptedAction>,
    until_ms: u64,
) -> (EventLog, LineRecorder, Vec<TickReport>) {
    let clock = SimClock::new();
    let mut delay = SimDelay::new(&clock);
    let mut panel = SimulatedPanel::new(&clock, script);
    let mut telemetry = LineRecorder::new();
    let mut events = EventLog::new();
    let mut reports = Vec::new();

    control.run(&clock, &mut delay, &mut panel, &mut telemetry, &mut events, |r| {
        reports.push(*r);
        r.now_ms < until_ms
    });
    assert!(panel.script_done());
    assert_eq!(panel.outputs().rgb, (0, 0, 0));
    assert!(!panel.outputs().relief);
    (events, telemetry, reports)
}

#[test]
fn run_ticks_at_fixed_period() {
    let mut config = SystemConfig::default();
    config.standby_ms = 0;
    let mut control = ControlLoop::new(config);
    let (_, telemetry, reports) = run_script(&mut control, Vec::new(), 1000);

    assert_eq!(control.tick_count(), 101);
    assert_eq!(reports.first().map(|r| r.now_ms), Some(0));
    assert_eq!(reports.last().map(|r| r.now_ms), Some(1000));
    assert!(reports.windows(2).all(|w| w[1].now_ms - w[0].now_ms == 10));
    assert_eq!(telemetry.lines.len(), 11);
}

#[test]
fn manual_esd_session() {
    let mut control = ControlLoop::new(SystemConfig::default());
    let script = vec![
        ScriptedAction::new(5_000, OperatorAction::PressEsd),
        ScriptedAction::new(9_000, OperatorAction::PressEsd),
        ScriptedAction::new(11_000, OperatorAction::Turn(-5)),
    ];
    let (events, _, reports) = run_script(&mut control, script, 12_000);

    assert_eq!(
        triggers(&events),
        vec![EsdTrigger::Operator, EsdTrigger::Converged, EsdTrigger::Operator]
    );
    assert!(reports.iter().take_while(|r| r.now_ms < 3_000).all(|r| !r.engaged));
    assert!(reports
        .iter()
        .filter(|r| (5_120..9_120).contains(&r.now_ms))
        .all(|r| r.esd == EsdState::ReadyForReset));
    assert_eq!(control.esd_state(), EsdState::Running);
    assert_eq!(control.process().valve_percent, 40.0);
}

#[test]
fn press_shorter_than_debounce_is_ignored() {
    let mut config = SystemConfig::default();
    config.standby_ms = 0;
    let mut control = ControlLoop::new(config);
    let clock = SimClock::new();
    let mut delay = SimDelay::new(&clock);
    let script = vec![
        ScriptedAction::new(500, OperatorAction::PressEsd),
        ScriptedAction::new(700, OperatorAction::PressMode),
    ];
    let mut panel = SimulatedPanel::new(&clock, script).with_press_hold(50);
    let mut telemetry = LineRecorder::new();
    let mut events = EventLog::new();

    control.run(&clock, &mut delay, &mut panel, &mut telemetry, &mut events, |r| {
        r.now_ms < 2_000
    });

    assert!(panel.script_done());
    assert!(triggers(&events).is_empty());
    assert_eq!(control.esd_state(), EsdState::Running);
    assert_eq!(control.mode(), Mode::Pressure);
}

#[test]
fn overpressure_session_converges_and_resets() {
    let mut control = ControlLoop::new(SystemConfig::default());
    control.process_mut().pressure = 470.0;
    let script = vec![ScriptedAction::new(48_000, OperatorAction::PressEsd)];
    let (events, telemetry, _) = run_script(&mut control, script, 50_000);

    assert_eq!(
        triggers(&events),
        vec![EsdTrigger::PressureHigh, EsdTrigger::Converged, EsdTrigger::Operator]
    );
    assert_eq!(control.esd_state(), EsdState::Running);
    assert!((control.process().pressure - 300.0).abs() <= 5.0);
    assert!(telemetry.lines.iter().any(|l| l.contains("RELIEF:Si")));
    assert!(telemetry.lines.last().is_some_and(|l| l.contains("ESD:Desactivado")));
}

#[test]
fn injected_actuator_fault_trips_esd() {
    let mut config = SystemConfig::default();
    config.standby_ms = 0;
    let mut control = ControlLoop::new(config);
    let clock = SimClock::new();
    let mut panel = SimulatedPanel::new(&clock, Vec::new());
    let mut telemetry = LineRecorder::new();
    let mut events = EventLog::new();

    control.start(clock.now_ms(), &mut panel, &mut events);
    control.tick(clock.now_ms(), &mut panel, &mut telemetry, &mut events);
    panel.inject_actuator_faults(1);
    for _ in 0..2 {
        clock.advance(10);
        control.tick(clock.now_ms(), &mut panel, &mut telemetry, &mut events);
    }

    assert_eq!(control.actuator_failures(), 1);
    assert_eq!(triggers(&events)[0], EsdTrigger::ActuatorFault);
    assert_ne!(control.esd_state(), EsdState::Running);
}

#[test]
fn injected_input_faults_hold_last_sample() {
    let mut config = SystemConfig::default();
    config.standby_ms = 0;
    let mut control = ControlLoop::new(config);
    let clock = SimClock::new();
    let script = vec![ScriptedAction::new(20, OperatorAction::Turn(2))];
    let mut panel = SimulatedPanel::new(&clock, script);
    let mut telemetry = LineRecorder::new();
    let mut events = EventLog::new();

    control.start(clock.now_ms(), &mut panel, &mut events);
    control.tick(clock.now_ms(), &mut panel, &mut telemetry, &mut events);
    panel.inject_input_faults(3);
    for _ in 0..3 {
        clock.advance(10);
        control.tick(clock.now_ms(), &mut panel, &mut telemetry, &mut events);
    }
    assert_eq!(control.held_samples(), 3);
    assert_eq!(control.process().valve_percent, 50.0);

    clock.advance(10);
    control.tick(clock.now_ms(), &mut panel, &mut telemetry, &mut events);
    assert_eq!(control.process().valve_percent, 54.0);
}
