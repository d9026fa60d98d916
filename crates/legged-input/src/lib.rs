//! Unified input-device abstraction.
//!
//! Two very different sources, a physical HID gamepad and a keyboard
//! pretending to be one, are normalized behind [`InputDevice`]: a fixed set
//! of [`Button`]s with held and just-released state, analog axes in
//! `[-1.0, 1.0]`, and 8-way hats.
//!
//! `update()` is the single synchronization point. It samples the source
//! once and recomputes the release edges, so callers must invoke it exactly
//! once per control cycle before reading any state.
//!
//! [`open_gamepad`] probes for a physical device and falls back to the
//! keyboard when none is attached.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod button;
pub mod device;
pub mod hid;
pub mod keyboard;
pub mod probe;
pub mod pump;
pub mod report;
pub mod state;

pub use button::Button;
pub use device::{DeviceKind, InputDevice};
pub use hid::{GamepadSource, HidApiSource, HidGamepad};
pub use keyboard::{Key, KeySnapshot, KeyboardGamepad};
pub use probe::{Gamepad, SystemGamepad, open_gamepad, open_gamepad_with};
pub use pump::{KeyPump, ScriptedKeyPump, TerminalKeyPump};
pub use report::{GamepadReport, HatDirection};
pub use state::InputState;
