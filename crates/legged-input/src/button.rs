//! Logical button layout shared by every input device.

use core::fmt;

/// Number of logical buttons.
pub const BUTTON_COUNT: usize = 15;

/// Logical gamepad buttons in standard PlayStation/Xbox order.
///
/// The discriminant is the button index used by [`InputDevice`](crate::InputDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Button {
    /// Cross / A
    A = 0,
    /// Circle / B
    B = 1,
    /// Square / X
    X = 2,
    /// Triangle / Y
    Y = 3,
    /// Left bumper
    L1 = 4,
    /// Right bumper
    R1 = 5,
    /// Select / Share
    Select = 6,
    /// Start / Options
    Start = 7,
    /// Left stick press
    L3 = 8,
    /// Right stick press
    R3 = 9,
    /// PS / Xbox guide button
    Home = 10,
    /// D-pad up, when reported as a button
    Up = 11,
    /// D-pad down
    Down = 12,
    /// D-pad left
    Left = 13,
    /// D-pad right
    Right = 14,
}

impl Button {
    /// Every button in index order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::L1,
        Button::R1,
        Button::Select,
        Button::Start,
        Button::L3,
        Button::R3,
        Button::Home,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    /// Button index.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a button by index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::L1 => "L1",
            Button::R1 => "R1",
            Button::Select => "SELECT",
            Button::Start => "START",
            Button::L3 => "L3",
            Button::R3 => "R3",
            Button::Home => "HOME",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
        };
        f.write_str(name)
    }
}
