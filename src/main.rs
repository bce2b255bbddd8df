//! VaporSur host simulator: main entry point.
//!
//! Runs the control loop against the simulated operator panel and prints
//! telemetry on stdout (line protocol or JSON).  Logs go to stderr via
//! `env_logger`; set `RUST_LOG=debug` for per-tick detail.
//!
//! ```text
//! vaporsur --scenario overpressure --duration-secs 60
//! vaporsur --config plant.json --format json --realtime
//! vaporsur --scenario manual-esd --press-hold-ms 60
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use embedded_hal::delay::DelayNs;
use log::info;

use vaporsur::adapters::config_file::JsonFileConfig;
use vaporsur::adapters::log_sink::LogEventSink;
use vaporsur::adapters::serial::{JsonTelemetry, SerialTelemetry};
use vaporsur::adapters::sim::{
    DEFAULT_PRESS_HOLD_MS, OperatorAction, ScriptedAction, SimClock, SimDelay,
    SimulatedPanel,
};
use vaporsur::adapters::time::{MonotonicClock, StdDelay};
use vaporsur::app::ports::{ClockPort, ConfigPort, TelemetrySink};
use vaporsur::{ControlLoop, SystemConfig};

#[derive(Parser)]
#[command(name = "vaporsur")]
#[command(about = "VaporSur node controller - host simulator", long_about = None)]
struct Cli {
    /// JSON configuration file (missing fields take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated run length, standby included
    #[arg(short, long, default_value_t = 60)]
    duration_secs: u64,

    /// Operator and plant scenario
    #[arg(short, long, value_enum, default_value_t = Scenario::Idle)]
    scenario: Scenario,

    /// Telemetry output format
    #[arg(short, long, value_enum, default_value_t = Format::Line)]
    format: Format,

    /// Tick against the wall clock instead of simulated time
    #[arg(long)]
    realtime: bool,

    /// How long the simulated operator holds each button press
    #[arg(long, default_value_t = DEFAULT_PRESS_HOLD_MS)]
    press_hold_ms: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Nominal plant, operator trims the valve once
    Idle,
    /// Line starts above the ESD limit; operator resets after convergence
    Overpressure,
    /// Line starts cold enough to latch preheat
    Underheat,
    /// Operator trips the ESD by hand, then resets it
    ManualEsd,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Line,
    Json,
}

impl Scenario {
    /// Operator script, relative to the end of standby.
    fn script(self, standby_ms: u64) -> Vec<ScriptedAction> {
        let at = |ms: u64| standby_ms + ms;
        match self {
            Self::Idle => vec![ScriptedAction::new(at(2_000), OperatorAction::Turn(3))],
            Self::Overpressure => vec![ScriptedAction::new(at(45_000), OperatorAction::PressEsd)],
            Self::Underheat => vec![
                ScriptedAction::new(at(1_000), OperatorAction::PressMode),
                ScriptedAction::new(at(2_000), OperatorAction::Turn(10)),
            ],
            Self::ManualEsd => vec![
                ScriptedAction::new(at(2_000), OperatorAction::PressEsd),
                ScriptedAction::new(at(6_000), OperatorAction::PressEsd),
                ScriptedAction::new(at(8_000), OperatorAction::Turn(-5)),
            ],
        }
    }

    /// Plant disturbance applied before the loop starts.
    fn disturb(self, control: &mut ControlLoop) {
        let process = control.process_mut();
        match self {
            Self::Overpressure => process.pressure = 470.0,
            Self::Underheat => process.temperature = 105.0,
            Self::Idle | Self::ManualEsd => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .context("logger init")?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JsonFileConfig::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => SystemConfig::default(),
    };
    let mut control = ControlLoop::try_new(config).context("invalid configuration")?;
    cli.scenario.disturb(&mut control);

    let stdout = io::stdout().lock();
    match cli.format {
        Format::Line => launch(&cli, control, &mut SerialTelemetry::new(stdout)),
        Format::Json => launch(&cli, control, &mut JsonTelemetry::new(stdout)),
    }
    Ok(())
}

fn launch(cli: &Cli, control: ControlLoop, telemetry: &mut impl TelemetrySink) {
    let config = control.config();
    let script = cli.scenario.script(u64::from(config.standby_ms));
    let duration_ms = cli.duration_secs.saturating_mul(1000);

    if cli.realtime {
        let clock = MonotonicClock::new();
        let mut panel = SimulatedPanel::new(clock, script).with_press_hold(cli.press_hold_ms);
        simulate(control, &clock, &mut StdDelay, &mut panel, telemetry, duration_ms);
    } else {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        let mut panel = SimulatedPanel::new(&clock, script).with_press_hold(cli.press_hold_ms);
        simulate(control, &clock, &mut delay, &mut panel, telemetry, duration_ms);
    }
}

fn simulate<C: ClockPort>(
    mut control: ControlLoop,
    clock: &impl ClockPort,
    delay: &mut impl DelayNs,
    panel: &mut SimulatedPanel<C>,
    telemetry: &mut impl TelemetrySink,
    duration_ms: u64,
) {
    let mut events = LogEventSink::new();
    control.run(clock, delay, panel, telemetry, &mut events, |report| {
        report.now_ms < duration_ms
    });

    let process = control.process();
    info!(
        "Simulation finished: {} ticks, ESD {}, P={:.1} T={:.1}, \
         held samples {}, actuator faults {}, telemetry faults {}",
        control.tick_count(),
        control.esd_state().name(),
        process.pressure,
        process.temperature,
        control.held_samples(),
        control.actuator_failures(),
        control.telemetry_failures()
    );
}
