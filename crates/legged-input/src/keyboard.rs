//! Keyboard-emulated gamepad.
//!
//! | Button | Key | | Axis | Negative | Positive |
//! |---|---|---|---|---|---|
//! | A | J | | 0 | A | D |
//! | B | K | | 1 | W | S |
//! | X | U | | 2 | Shift+Left | Shift+Right |
//! | Y | I | | 3 | Shift+Up | Shift+Down |
//! | L1 | Q | | | | |
//! | R1 | E | | | | |
//! | SELECT | Esc | | | | |
//! | START | Space | | | | |
//! | L3 / R3 / HOME | F / G / H | | | | |
//! | UP / DOWN / LEFT / RIGHT | arrows | | | | |
//!
//! Without Shift the arrows also drive hat 0.

use std::collections::BTreeSet;

use legged_errors::DeviceError;

use crate::button::{BUTTON_COUNT, Button};
use crate::device::{DeviceKind, InputDevice};
use crate::pump::KeyPump;
use crate::state::InputState;

/// Number of emulated axes.
pub const KEYBOARD_AXES: usize = 4;

/// A physical key as seen by the emulated gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A letter key, always lowercase
    Char(char),
    Esc,
    Space,
    Up,
    Down,
    Left,
    Right,
    /// Either shift key
    Shift,
}

impl Key {
    /// Letter key, normalized to lowercase.
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }
}

/// Button-to-key bindings, indexed by button.
pub const KEY_MAP: [(Button, Key); BUTTON_COUNT] = [
    (Button::A, Key::Char('j')),
    (Button::B, Key::Char('k')),
    (Button::X, Key::Char('u')),
    (Button::Y, Key::Char('i')),
    (Button::L1, Key::Char('q')),
    (Button::R1, Key::Char('e')),
    (Button::Select, Key::Esc),
    (Button::Start, Key::Space),
    (Button::L3, Key::Char('f')),
    (Button::R3, Key::Char('g')),
    (Button::Home, Key::Char('h')),
    (Button::Up, Key::Up),
    (Button::Down, Key::Down),
    (Button::Left, Key::Left),
    (Button::Right, Key::Right),
];

/// (negative, positive) key pairs per axis.
const AXIS_KEYS: [(Key, Key); KEYBOARD_AXES] = [
    (Key::Char('a'), Key::Char('d')),
    (Key::Char('w'), Key::Char('s')),
    (Key::Left, Key::Right),
    (Key::Up, Key::Down),
];

/// Axes at or above this index respond only while Shift is held.
const SHIFTED_AXES_FROM: usize = 2;

/// The set of keys held at the moment of the last pump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    held: BTreeSet<Key>,
}

impl KeySnapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is held.
    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Replace the held set.
    pub fn set(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.held.clear();
        self.held.extend(keys);
    }

    /// Mark `key` as held.
    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    /// Mark `key` as released.
    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Iterate held keys.
    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter().copied()
    }
}

/// Gamepad emulated from keyboard state. Construction never fails.
#[derive(Debug)]
pub struct KeyboardGamepad<P: KeyPump> {
    pump: P,
    snapshot: KeySnapshot,
    state: InputState,
}

impl<P: KeyPump> KeyboardGamepad<P> {
    /// Create an emulated gamepad fed by `pump`.
    pub fn new(pump: P) -> Self {
        Self {
            pump,
            snapshot: KeySnapshot::new(),
            state: InputState::new(BUTTON_COUNT, KEYBOARD_AXES, 1),
        }
    }

    /// Keys observed at the last update.
    pub fn snapshot(&self) -> &KeySnapshot {
        &self.snapshot
    }

    /// The key pump.
    pub fn pump(&self) -> &P {
        &self.pump
    }

    /// Mutable access to the key pump.
    pub fn pump_mut(&mut self) -> &mut P {
        &mut self.pump
    }
}

fn digital_axis(snapshot: &KeySnapshot, negative: Key, positive: Key) -> f32 {
    match (snapshot.is_held(negative), snapshot.is_held(positive)) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

fn arrow_hat(snapshot: &KeySnapshot) -> (i8, i8) {
    if snapshot.is_held(Key::Shift) {
        return (0, 0);
    }
    let x = if snapshot.is_held(Key::Left) {
        -1
    } else if snapshot.is_held(Key::Right) {
        1
    } else {
        0
    };
    let y = if snapshot.is_held(Key::Up) {
        1
    } else if snapshot.is_held(Key::Down) {
        -1
    } else {
        0
    };
    (x, y)
}

impl<P: KeyPump> InputDevice for KeyboardGamepad<P> {
    fn update(&mut self) -> Result<(), DeviceError> {
        if let Err(e) = self.pump.pump(&mut self.snapshot) {
            self.state.hold();
            return Err(e);
        }

        let snapshot = &self.snapshot;
        let shift = snapshot.is_held(Key::Shift);
        let axes: [f32; KEYBOARD_AXES] = core::array::from_fn(|i| match AXIS_KEYS.get(i) {
            Some(&(negative, positive)) if i < SHIFTED_AXES_FROM || shift => {
                digital_axis(snapshot, negative, positive)
            }
            _ => 0.0,
        });
        let hat = arrow_hat(snapshot);

        self.state.apply(
            |i| KEY_MAP.get(i).is_some_and(|&(_, key)| snapshot.is_held(key)),
            &axes,
            &[hat],
        );
        Ok(())
    }

    fn is_pressed_index(&self, index: usize) -> bool {
        self.state.is_pressed(index)
    }

    fn is_released_index(&self, index: usize) -> bool {
        self.state.is_released(index)
    }

    fn axis_value(&self, axis: usize) -> f32 {
        self.state.axis(axis)
    }

    fn hat_direction(&self, hat: usize) -> (i8, i8) {
        self.state.hat(hat)
    }

    fn button_count(&self) -> usize {
        self.state.button_count()
    }

    fn axis_count(&self) -> usize {
        self.state.axis_count()
    }

    fn hat_count(&self) -> usize {
        self.state.hat_count()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Emulated
    }
}
