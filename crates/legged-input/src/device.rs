//! The device trait.

use legged_errors::DeviceError;

use crate::button::Button;

/// Which family of device backs an [`InputDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// A physical HID gamepad or joystick
    Physical,
    /// The keyboard-emulated gamepad
    Emulated,
}

/// Common interface over physical and emulated gamepads.
///
/// All queries are non-panicking: an index outside the device's range reads
/// as released, centered, or neutral.
pub trait InputDevice {
    /// Sample the device once and recompute release edges.
    ///
    /// After this returns, [`is_released`](Self::is_released) is true only for
    /// buttons that were held on the previous update and are not held now.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] when the backend could not be read. The
    /// previous sample is retained and release edges are cleared.
    fn update(&mut self) -> Result<(), DeviceError>;

    /// Whether the button at `index` is currently held.
    fn is_pressed_index(&self, index: usize) -> bool;

    /// Whether the button at `index` was released during the last update.
    fn is_released_index(&self, index: usize) -> bool;

    /// Axis value in `[-1.0, 1.0]`, or `0.0` for an unknown axis.
    fn axis_value(&self, axis: usize) -> f32;

    /// Hat direction as `(x, y)` in `{-1, 0, 1}`, or `(0, 0)` for an unknown hat.
    fn hat_direction(&self, hat: usize) -> (i8, i8);

    /// Number of buttons, fixed at construction.
    fn button_count(&self) -> usize;

    /// Number of axes, fixed at construction.
    fn axis_count(&self) -> usize;

    /// Number of hats, fixed at construction.
    fn hat_count(&self) -> usize;

    /// Device family.
    fn kind(&self) -> DeviceKind;

    /// Whether `button` is currently held.
    fn is_pressed(&self, button: Button) -> bool {
        self.is_pressed_index(button.index())
    }

    /// Whether `button` was released during the last update.
    fn is_released(&self, button: Button) -> bool {
        self.is_released_index(button.index())
    }
}
