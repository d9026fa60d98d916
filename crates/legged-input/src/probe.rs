//! Startup device selection.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use legged_errors::DeviceError;

use crate::device::{DeviceKind, InputDevice};
use crate::hid::{GamepadSource, HidApiSource, HidGamepad};
use crate::keyboard::KeyboardGamepad;
use crate::pump::{KeyPump, TerminalKeyPump};

/// The device chosen at startup.
#[derive(Debug)]
pub enum Gamepad<S: GamepadSource, P: KeyPump> {
    /// A physical HID gamepad
    Physical(HidGamepad<S>),
    /// The keyboard fallback
    Emulated(KeyboardGamepad<P>),
}

/// Production gamepad type.
pub type SystemGamepad = Gamepad<HidApiSource, TerminalKeyPump>;

macro_rules! delegate {
    ($self:ident, $pad:ident => $body:expr) => {
        match $self {
            Gamepad::Physical($pad) => $body,
            Gamepad::Emulated($pad) => $body,
        }
    };
}

impl<S: GamepadSource, P: KeyPump> InputDevice for Gamepad<S, P> {
    fn update(&mut self) -> Result<(), DeviceError> {
        delegate!(self, pad => pad.update())
    }

    fn is_pressed_index(&self, index: usize) -> bool {
        delegate!(self, pad => pad.is_pressed_index(index))
    }

    fn is_released_index(&self, index: usize) -> bool {
        delegate!(self, pad => pad.is_released_index(index))
    }

    fn axis_value(&self, axis: usize) -> f32 {
        delegate!(self, pad => pad.axis_value(axis))
    }

    fn hat_direction(&self, hat: usize) -> (i8, i8) {
        delegate!(self, pad => pad.hat_direction(hat))
    }

    fn button_count(&self) -> usize {
        delegate!(self, pad => pad.button_count())
    }

    fn axis_count(&self) -> usize {
        delegate!(self, pad => pad.axis_count())
    }

    fn hat_count(&self) -> usize {
        delegate!(self, pad => pad.hat_count())
    }

    fn kind(&self) -> DeviceKind {
        delegate!(self, pad => pad.kind())
    }
}

/// Try `open_physical`; on [`DeviceError::NoDevice`] fall back to a keyboard
/// gamepad fed by `open_pump`.
///
/// # Errors
///
/// Propagates any other physical-device error, and any error from
/// `open_pump`.
pub fn open_gamepad_with<S, P>(
    open_physical: impl FnOnce() -> Result<S, DeviceError>,
    open_pump: impl FnOnce() -> Result<P, DeviceError>,
) -> Result<Gamepad<S, P>, DeviceError>
where
    S: GamepadSource,
    P: KeyPump,
{
    match open_physical() {
        Ok(source) => {
            tracing::info!(device = source.name(), "using physical gamepad");
            Ok(Gamepad::Physical(HidGamepad::new(source)))
        }
        Err(e) if e.should_fall_back() => {
            tracing::warn!("no gamepad connected, falling back to keyboard control");
            Ok(Gamepad::Emulated(KeyboardGamepad::new(open_pump()?)))
        }
        Err(e) => Err(e),
    }
}

/// Open the production gamepad.
///
/// With `force_keyboard` the physical probe is skipped. `interrupt` is set
/// when Ctrl+C is typed into the emulated gamepad's terminal.
///
/// # Errors
///
/// See [`open_gamepad_with`].
pub fn open_gamepad(
    force_keyboard: bool,
    interrupt: Arc<AtomicBool>,
) -> Result<SystemGamepad, DeviceError> {
    let open_pump = || TerminalKeyPump::new().map(|pump| pump.with_interrupt(interrupt));
    if force_keyboard {
        tracing::info!("keyboard control requested");
        return Ok(Gamepad::Emulated(KeyboardGamepad::new(open_pump()?)));
    }
    open_gamepad_with(HidApiSource::open, open_pump)
}
