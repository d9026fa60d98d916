//! Decoding of the common HID gamepad input report.
//!
//! Layout (little-endian, no report ID):
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 2 | button bitmask, bit `i` = button `i` |
//! | 2 | 2 | axis 0 (left stick X), signed |
//! | 4 | 2 | axis 1 (left stick Y), signed |
//! | 6 | 2 | axis 2 (right stick X), signed |
//! | 8 | 2 | axis 3 (right stick Y), signed |
//! | 10 | 1 | hat switch, low nibble, 0 = up then clockwise, >7 = neutral |

/// Minimum report length accepted by [`GamepadReport::parse`].
pub const REPORT_LEN: usize = 11;

/// Number of buttons carried in the bitmask.
pub const REPORT_BUTTONS: usize = 16;

/// Number of axes carried in the report.
pub const REPORT_AXES: usize = 4;

/// One decoded input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamepadReport {
    /// Button bitmask
    pub buttons: u16,
    /// Raw signed axes
    pub axes: [i16; REPORT_AXES],
    /// Hat switch nibble
    pub hat: u8,
}

impl Default for GamepadReport {
    fn default() -> Self {
        Self {
            buttons: 0,
            axes: [0; REPORT_AXES],
            hat: 0x0F,
        }
    }
}

impl GamepadReport {
    /// Decode a report. Returns `None` when `data` is shorter than [`REPORT_LEN`].
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < REPORT_LEN {
            return None;
        }

        let word = |offset: usize| -> Option<[u8; 2]> {
            let bytes = data.get(offset..offset + 2)?;
            <[u8; 2]>::try_from(bytes).ok()
        };

        let buttons = u16::from_le_bytes(word(0)?);
        let mut axes = [0i16; REPORT_AXES];
        for (i, axis) in axes.iter_mut().enumerate() {
            *axis = i16::from_le_bytes(word(2 + i * 2)?);
        }
        let hat = data.get(10).copied()? & 0x0F;

        Some(Self { buttons, axes, hat })
    }

    /// Whether button `index` is set. Out-of-range indices read as released.
    pub fn button(&self, index: usize) -> bool {
        if index >= REPORT_BUTTONS {
            return false;
        }
        (self.buttons & (1 << index)) != 0
    }

    /// Axis normalized to `[-1.0, 1.0]`.
    pub fn axis_normalized(&self, index: usize) -> f32 {
        let raw = self.axes.get(index).copied().unwrap_or(0);
        (f32::from(raw) / f32::from(i16::MAX)).clamp(-1.0, 1.0)
    }

    /// Decoded hat direction.
    pub fn hat_direction(&self) -> HatDirection {
        HatDirection::from_nibble(self.hat)
    }
}

/// 8-way hat switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HatDirection {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
    #[default]
    Neutral,
}

impl HatDirection {
    /// Decode a hat nibble (0 = up, clockwise).
    pub fn from_nibble(value: u8) -> Self {
        match value {
            0 => HatDirection::Up,
            1 => HatDirection::UpRight,
            2 => HatDirection::Right,
            3 => HatDirection::DownRight,
            4 => HatDirection::Down,
            5 => HatDirection::DownLeft,
            6 => HatDirection::Left,
            7 => HatDirection::UpLeft,
            _ => HatDirection::Neutral,
        }
    }

    /// `(x, y)` with right and up positive.
    pub fn as_xy(self) -> (i8, i8) {
        match self {
            HatDirection::Up => (0, 1),
            HatDirection::UpRight => (1, 1),
            HatDirection::Right => (1, 0),
            HatDirection::DownRight => (1, -1),
            HatDirection::Down => (0, -1),
            HatDirection::DownLeft => (-1, -1),
            HatDirection::Left => (-1, 0),
            HatDirection::UpLeft => (-1, 1),
            HatDirection::Neutral => (0, 0),
        }
    }
}
