//! End-to-end ESD scenarios driven through the ControlLoop ports.

use super::mock_hw::Rig;

use vaporsur::app::events::AppEvent;
use vaporsur::drivers::button::PinLevel;
use vaporsur::drivers::led_patterns::{COLOUR_CRITICAL, COLOUR_NORMAL, COLOUR_OFF};
use vaporsur::esd::{EsdState, EsdTrigger};
use vaporsur::flow::FlowRegime;

fn transitions(rig: &Rig) -> Vec<(EsdState, EsdState, EsdTrigger)> {
    rig.events
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::EsdTransition(t) => Some((t.from, t.to, t.trigger)),
            _ => None,
        })
        .collect()
}

/// Trip on overpressure and return the rig in `Active`.
fn tripped() -> Rig {
    let mut rig = Rig::engaged();
    rig.set_process(470.0, 150.0);
    rig.tick();
    assert_eq!(rig.app.esd_state(), EsdState::Active);
    rig
}

// ── Trip ─────────────────────────────────────────────────────

#[test]
fn overpressure_trips_and_opens_relief_next_tick() {
    let mut rig = Rig::engaged();
    rig.set_process(470.0, 150.0);
    let report = rig.tick();

    assert_eq!(report.esd, EsdState::Active);
    assert_eq!(report.status.label(), "ESD: Reduciendo Presión");
    assert_eq!(report.flow.regime, FlowRegime::None);
    assert!(rig.hw.relief_open());
    assert!(rig.hw.laser_on());
    assert_eq!(rig.hw.valve(), Some(50.0));

    // The first engaged tick integrates zero elapsed time.
    rig.tick();
    assert!(rig.app.process().pressure < 470.0);
    assert_eq!(
        transitions(&rig),
        vec![(EsdState::Running, EsdState::Active, EsdTrigger::PressureHigh)]
    );

    let line = &rig.telemetry.lines[0];
    assert!(line.contains("ESD:Activado"), "{line}");
    assert!(line.contains("ESTADO:ESD: Reduciendo Presión"), "{line}");
    assert!(line.contains("RELIEF:Si"), "{line}");
    assert!(line.contains("F:None"), "{line}");
}

#[test]
fn overtemperature_trips_and_purges() {
    let mut rig = Rig::engaged();
    rig.set_process(300.0, 195.0);
    let report = rig.tick();
    assert_eq!(report.esd, EsdState::Active);
    assert_eq!(report.status.label(), "ESD: Reduciendo Temperatura");
    assert_eq!(rig.hw.heater(), Some(50.0));
    assert!(rig.telemetry.lines[0].contains("PURGE:Si"));
    assert!(!rig.hw.relief_open());
}

#[test]
fn trip_clears_active_override() {
    let mut rig = Rig::engaged();
    rig.set_process(300.0, 100.0);
    rig.tick();
    assert!(rig.app.overrides().preheat);

    rig.set_process(470.0, 100.0);
    rig.tick();
    assert_eq!(rig.app.esd_state(), EsdState::Active);
    assert!(!rig.app.overrides().any());
}

#[test]
fn active_indicator_blinks_red() {
    let mut rig = tripped();
    rig.ticks(100);
    let colours = rig.hw.colours();
    assert!(colours.contains(&COLOUR_CRITICAL));
    assert!(colours.contains(&COLOUR_OFF));
    assert!(colours.iter().all(|c| *c == COLOUR_CRITICAL || *c == COLOUR_OFF));
}

// ── Active ───────────────────────────────────────────────────

#[test]
fn operator_press_while_active_is_ignored() {
    let mut rig = tripped();
    let report = rig.press_esd();
    assert_eq!(report.esd, EsdState::Active);
    assert_eq!(transitions(&rig).len(), 1);
}

#[test]
fn encoder_ignored_while_active() {
    let mut rig = tripped();
    rig.hw.input.encoder_position = 20;
    rig.tick();
    assert_eq!(rig.app.process().valve_percent, 50.0);
}

#[test]
fn partial_convergence_stays_active() {
    let mut rig = tripped();
    rig.set_process(301.0, 160.0);
    let report = rig.tick();
    assert_eq!(report.esd, EsdState::Active);
    assert_eq!(report.status.label(), "ESD: Reduciendo Temperatura");
}

#[test]
fn low_values_are_raised() {
    let mut rig = tripped();
    rig.set_process(250.0, 120.0);
    let report = rig.tick();
    assert_eq!(rig.hw.valve(), Some(0.0));
    assert_eq!(rig.hw.heater(), Some(100.0));
    assert!(!rig.hw.relief_open());
    assert_eq!(report.status.label(), "ESD: Aumentando Temperatura");
}

// ── Convergence and reset ────────────────────────────────────

#[test]
fn converged_values_ready_for_reset() {
    let mut rig = tripped();
    rig.set_process(301.0, 149.0);
    let report = rig.tick();
    assert_eq!(report.esd, EsdState::ReadyForReset);
    assert_eq!(report.status.label(), "ESD: Listo para el Reinicio");
    assert_eq!(rig.hw.colours().last(), Some(&COLOUR_NORMAL));
    assert_eq!(
        transitions(&rig).last(),
        Some(&(EsdState::Active, EsdState::ReadyForReset, EsdTrigger::Converged))
    );
}

#[test]
fn ready_for_reset_waits_for_press() {
    let mut rig = tripped();
    rig.set_process(301.0, 149.0);
    rig.tick();
    for _ in 0..200 {
        assert_eq!(rig.tick().esd, EsdState::ReadyForReset);
    }
    // 120 ms debounce at 10 ms per tick: the 13th low sample registers.
    rig.esd_button(PinLevel::Low);
    for _ in 0..12 {
        assert_eq!(rig.tick().esd, EsdState::ReadyForReset);
    }
    assert_eq!(rig.tick().esd, EsdState::Running);
    // Holding the button down resets only once.
    for _ in 0..50 {
        assert_eq!(rig.tick().esd, EsdState::Running);
    }
    assert!(!rig.app.overrides().any());
    assert_eq!(
        transitions(&rig).last(),
        Some(&(EsdState::ReadyForReset, EsdState::Running, EsdTrigger::Operator))
    );
}

#[test]
fn overpressure_recovers_without_intervention() {
    let mut rig = tripped();
    let mut ready = false;
    for _ in 0..10_000 {
        if rig.tick().esd == EsdState::ReadyForReset {
            ready = true;
            break;
        }
    }
    assert!(ready, "control law did not converge");
    let p = rig.app.process().pressure;
    assert!((p - 300.0).abs() <= 5.0, "P={p}");

    let report = rig.press_esd();
    assert_eq!(report.esd, EsdState::Running);
    rig.ticks(10);
    assert!(rig.telemetry.lines.last().unwrap().contains("ESD:Desactivado"));
}

// ── Manual and fault trips ───────────────────────────────────

#[test]
fn manual_trip_at_nominal_goes_straight_to_ready() {
    let mut rig = Rig::engaged();
    rig.tick();
    let report = rig.press_esd();
    assert_eq!(report.esd, EsdState::ReadyForReset);
    assert_eq!(
        transitions(&rig),
        vec![
            (EsdState::Running, EsdState::Active, EsdTrigger::Operator),
            (EsdState::Active, EsdState::ReadyForReset, EsdTrigger::Converged),
        ]
    );
}

#[test]
fn bounce_does_not_trip() {
    let mut rig = Rig::engaged();
    rig.tick();
    for level in [PinLevel::Low, PinLevel::High, PinLevel::Low, PinLevel::High] {
        rig.esd_button(level);
        assert_eq!(rig.tick().esd, EsdState::Running);
    }
    rig.ticks(20);
    assert_eq!(rig.app.esd_state(), EsdState::Running);
    assert!(transitions(&rig).is_empty());
}

#[test]
fn bounce_after_manual_trip_does_not_reset() {
    let mut rig = Rig::engaged();
    rig.tick();
    assert_eq!(rig.press_esd().esd, EsdState::ReadyForReset);

    for _ in 0..5 {
        for level in [PinLevel::Low, PinLevel::High, PinLevel::Low] {
            rig.esd_button(level);
            assert_eq!(rig.tick().esd, EsdState::ReadyForReset);
        }
        rig.esd_button(PinLevel::High);
        rig.tick();
    }
    assert_eq!(rig.app.esd_state(), EsdState::ReadyForReset);
    assert!(!transitions(&rig)
        .iter()
        .any(|t| *t == (EsdState::ReadyForReset, EsdState::Running, EsdTrigger::Operator)));
}

#[test]
fn contact_chatter_after_press_is_absorbed() {
    // Trip press, then the contact chatters on release.
    let mut rig = Rig::engaged();
    rig.tick();
    rig.esd_button(PinLevel::Low);
    rig.ticks(13);
    assert_eq!(rig.app.esd_state(), EsdState::ReadyForReset);
    for level in [PinLevel::High, PinLevel::Low, PinLevel::High, PinLevel::Low, PinLevel::High] {
        rig.esd_button(level);
        assert_eq!(rig.tick().esd, EsdState::ReadyForReset);
    }
    assert_eq!(transitions(&rig).len(), 2);
}

#[test]
fn actuator_fault_trips_next_tick() {
    let mut rig = Rig::engaged();
    rig.tick();
    rig.hw.write_fault = true;
    let report = rig.tick();
    assert_eq!(report.esd, EsdState::Running);
    assert_eq!(
        rig.events.count(|e| matches!(e, AppEvent::ActuatorFault(_))),
        1
    );

    rig.hw.write_fault = false;
    rig.tick();
    assert!(rig.app.esd_state() != EsdState::Running);
    assert_eq!(
        transitions(&rig)[0],
        (EsdState::Running, EsdState::Active, EsdTrigger::ActuatorFault)
    );
}

#[test]
fn actuator_fault_in_esd_does_not_retrip() {
    let mut rig = tripped();
    rig.hw.write_fault = true;
    rig.ticks(3);
    rig.hw.write_fault = false;
    rig.ticks(3);
    assert_eq!(transitions(&rig).len(), 1);
    assert_eq!(rig.app.esd_state(), EsdState::Active);
}
