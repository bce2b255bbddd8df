//! Hardware panel adapter: bridges `embedded-hal` 1.0 peripherals to the
//! domain port traits.
//!
//! Generic over the HAL's pin and PWM types, so any board crate that
//! implements `embedded-hal` plugs in without touching the control core.
//! Pin assignment and peripheral initialisation stay with the board
//! crate; this adapter only reads and writes already-configured handles.
//!
//! | Port method          | Peripheral                       |
//! |----------------------|----------------------------------|
//! | `sample`             | `PositionCounter` + 2 × `InputPin` |
//! | `set_valve/heater`   | `SetDutyCycle`                   |
//! | relief/purge/flow/laser | `OutputPin`                   |
//! | `set_status_colour`  | 3 × `SetDutyCycle` (R, G, B)     |

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::app::ports::{ActuatorPort, InputPort, InputSample};
use crate::drivers::actuator::percent_to_duty;
use crate::drivers::button::PinLevel;
use crate::error::{ActuatorError, InputError};

/// Quadrature counter peripheral (PCNT, timer encoder mode, ...).
pub trait PositionCounter {
    type Error: core::fmt::Debug;

    /// Absolute detent count.
    fn position(&mut self) -> Result<i32, Self::Error>;
}

/// Operator inputs.
pub struct PanelInputs<C, B> {
    pub encoder: C,
    pub mode_button: B,
    pub esd_button: B,
}

/// Actuator outputs.
pub struct PanelOutputs<D, P> {
    pub valve: P,
    pub heater: P,
    pub relief: D,
    pub purge: D,
    pub flow_indicator: D,
    pub laser: D,
    pub led_red: P,
    pub led_green: P,
    pub led_blue: P,
}

/// Concrete adapter that combines the panel behind port traits.
pub struct GpioPanel<C, B, D, P> {
    inputs: PanelInputs<C, B>,
    outputs: PanelOutputs<D, P>,
}

impl<C, B, D, P> GpioPanel<C, B, D, P>
where
    C: PositionCounter,
    B: InputPin,
    D: OutputPin,
    P: SetDutyCycle,
{
    pub fn new(inputs: PanelInputs<C, B>, outputs: PanelOutputs<D, P>) -> Self {
        Self { inputs, outputs }
    }

    fn read_level(pin: &mut B) -> Result<PinLevel, InputError> {
        match pin.is_low() {
            Ok(true) => Ok(PinLevel::Low),
            Ok(false) => Ok(PinLevel::High),
            Err(e) => {
                debug!("button read failed: {:?}", e);
                Err(InputError::GpioReadFailed)
            }
        }
    }

    fn write_percent(channel: &mut P, percent: f32) -> Result<(), ActuatorError> {
        let duty = percent_to_duty(percent, channel.max_duty_cycle());
        channel.set_duty_cycle(duty).map_err(|e| {
            debug!("PWM write failed: {:?}", e);
            ActuatorError::PwmWriteFailed
        })
    }

    fn write_level(pin: &mut D, on: bool) -> Result<(), ActuatorError> {
        pin.set_state(PinState::from(on)).map_err(|e| {
            debug!("GPIO write failed: {:?}", e);
            ActuatorError::GpioWriteFailed
        })
    }

    fn write_channel(channel: &mut P, value: u8) -> Result<(), ActuatorError> {
        channel
            .set_duty_cycle_fraction(u16::from(value), u16::from(u8::MAX))
            .map_err(|e| {
                debug!("LED PWM write failed: {:?}", e);
                ActuatorError::PwmWriteFailed
            })
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<C, B, D, P> InputPort for GpioPanel<C, B, D, P>
where
    C: PositionCounter,
    B: InputPin,
    D: OutputPin,
    P: SetDutyCycle,
{
    fn sample(&mut self) -> Result<InputSample, InputError> {
        let encoder_position = self.inputs.encoder.position().map_err(|e| {
            debug!("encoder read failed: {:?}", e);
            InputError::EncoderReadFailed
        })?;
        Ok(InputSample {
            encoder_position,
            mode_button: Self::read_level(&mut self.inputs.mode_button)?,
            esd_button: Self::read_level(&mut self.inputs.esd_button)?,
        })
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<C, B, D, P> ActuatorPort for GpioPanel<C, B, D, P>
where
    C: PositionCounter,
    B: InputPin,
    D: OutputPin,
    P: SetDutyCycle,
{
    fn set_valve(&mut self, percent: f32) -> Result<(), ActuatorError> {
        Self::write_percent(&mut self.outputs.valve, percent)
    }

    fn set_heater(&mut self, percent: f32) -> Result<(), ActuatorError> {
        Self::write_percent(&mut self.outputs.heater, percent)
    }

    fn set_relief(&mut self, open: bool) -> Result<(), ActuatorError> {
        Self::write_level(&mut self.outputs.relief, open)
    }

    fn set_purge(&mut self, open: bool) -> Result<(), ActuatorError> {
        Self::write_level(&mut self.outputs.purge, open)
    }

    fn set_flow_indicator(&mut self, on: bool) -> Result<(), ActuatorError> {
        Self::write_level(&mut self.outputs.flow_indicator, on)
    }

    fn set_laser(&mut self, on: bool) -> Result<(), ActuatorError> {
        Self::write_level(&mut self.outputs.laser, on)
    }

    fn set_status_colour(&mut self, r: u8, g: u8, b: u8) -> Result<(), ActuatorError> {
        let red = Self::write_channel(&mut self.outputs.led_red, r);
        let green = Self::write_channel(&mut self.outputs.led_green, g);
        let blue = Self::write_channel(&mut self.outputs.led_blue, b);
        red.and(green).and(blue)
    }

    fn all_off(&mut self) -> Result<(), ActuatorError> {
        let results = [
            self.set_valve(0.0),
            self.set_heater(0.0),
            self.set_relief(false),
            self.set_purge(false),
            self.set_flow_indicator(false),
            self.set_laser(false),
            self.set_status_colour(0, 0, 0),
        ];
        results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
    }
}
