//! Operator command mapping.
//!
//! Mode commands are edge-triggered on button *release*, optionally gated by
//! a held modifier. The chord table is evaluated top to bottom every cycle
//! and the last matching entry wins, so `L1 + Y` (SKILL_4) beats `R1 + Y`
//! (SKILL_2) when both modifiers are held.

use core::fmt;

use legged_input::{Button, InputDevice};

/// Mode switch requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeCommand {
    /// Zero-torque damping (L3)
    Passive,
    /// Return to the default pose (START)
    PosReset,
    /// Locomotion (R1 + A)
    Loco,
    /// First skill slot (R1 + X)
    Skill1,
    /// Second skill slot (R1 + Y)
    Skill2,
    /// Third skill slot (R1 + B)
    Skill3,
    /// Fourth skill slot (L1 + Y)
    Skill4,
}

impl fmt::Display for ModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeCommand::Passive => "PASSIVE",
            ModeCommand::PosReset => "POS_RESET",
            ModeCommand::Loco => "LOCO",
            ModeCommand::Skill1 => "SKILL_1",
            ModeCommand::Skill2 => "SKILL_2",
            ModeCommand::Skill3 => "SKILL_3",
            ModeCommand::Skill4 => "SKILL_4",
        };
        f.write_str(name)
    }
}

/// A release-triggered mode binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    /// Button that must be held, if any
    pub modifier: Option<Button>,
    /// Button whose release fires the chord
    pub trigger: Button,
    /// Resulting command
    pub command: ModeCommand,
}

impl Chord {
    const fn released(trigger: Button, command: ModeCommand) -> Self {
        Self {
            modifier: None,
            trigger,
            command,
        }
    }

    const fn held(modifier: Button, trigger: Button, command: ModeCommand) -> Self {
        Self {
            modifier: Some(modifier),
            trigger,
            command,
        }
    }

    /// Whether this chord fires on the device's current state.
    pub fn matches<D: InputDevice + ?Sized>(&self, device: &D) -> bool {
        device.is_released(self.trigger) && self.modifier.is_none_or(|m| device.is_pressed(m))
    }
}

/// Chord table in evaluation order.
pub const CHORDS: [Chord; 7] = [
    Chord::released(Button::L3, ModeCommand::Passive),
    Chord::released(Button::Start, ModeCommand::PosReset),
    Chord::held(Button::R1, Button::A, ModeCommand::Loco),
    Chord::held(Button::R1, Button::X, ModeCommand::Skill1),
    Chord::held(Button::R1, Button::Y, ModeCommand::Skill2),
    Chord::held(Button::R1, Button::B, ModeCommand::Skill3),
    Chord::held(Button::L1, Button::Y, ModeCommand::Skill4),
];

/// Commands derived from one cycle's input state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommandVector {
    /// Mode switch fired this cycle, if any
    pub mode_cmd: Option<ModeCommand>,
    /// Body velocity command: forward, lateral, yaw
    pub velocity_cmd: [f32; 3],
    /// SELECT is held
    pub exit_requested: bool,
    /// First axis that read non-finite and was replaced by zero
    pub non_finite_axis: Option<usize>,
}

/// Pure mapping from input state to [`CommandVector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandMapper;

impl CommandMapper {
    /// Map the device's current state.
    ///
    /// `velocity_cmd = [-axis(1), -axis(0), -axis(3)]`: stick up drives
    /// forward, stick left drives left, right stick left yaws left.
    pub fn map<D: InputDevice + ?Sized>(device: &D) -> CommandVector {
        let mode_cmd = CHORDS
            .iter()
            .rev()
            .find(|chord| chord.matches(device))
            .map(|chord| chord.command);

        let mut non_finite_axis = None;
        let mut axis = |index: usize| {
            let value = device.axis_value(index);
            if value.is_finite() {
                value
            } else {
                if non_finite_axis.is_none() {
                    non_finite_axis = Some(index);
                }
                0.0
            }
        };
        let velocity_cmd = [-axis(1), -axis(0), -axis(3)];

        CommandVector {
            mode_cmd,
            velocity_cmd,
            exit_requested: device.is_pressed(Button::Select),
            non_finite_axis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legged_errors::DeviceError;
    use legged_input::DeviceKind;

    /// Device whose state is set directly.
    #[derive(Default)]
    struct FakePad {
        pressed: Vec<Button>,
        released: Vec<Button>,
        axes: [f32; 4],
    }

    impl InputDevice for FakePad {
        fn update(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
        fn is_pressed_index(&self, index: usize) -> bool {
            self.pressed.iter().any(|b| b.index() == index)
        }
        fn is_released_index(&self, index: usize) -> bool {
            self.released.iter().any(|b| b.index() == index)
        }
        fn axis_value(&self, axis: usize) -> f32 {
            self.axes.get(axis).copied().unwrap_or(0.0)
        }
        fn hat_direction(&self, _hat: usize) -> (i8, i8) {
            (0, 0)
        }
        fn button_count(&self) -> usize {
            15
        }
        fn axis_count(&self) -> usize {
            4
        }
        fn hat_count(&self) -> usize {
            0
        }
        fn kind(&self) -> DeviceKind {
            DeviceKind::Emulated
        }
    }

    fn pad(pressed: &[Button], released: &[Button]) -> FakePad {
        FakePad {
            pressed: pressed.to_vec(),
            released: released.to_vec(),
            ..FakePad::default()
        }
    }

    #[test]
    fn test_single_button_chords() {
        assert_eq!(
            CommandMapper::map(&pad(&[], &[Button::L3])).mode_cmd,
            Some(ModeCommand::Passive)
        );
        assert_eq!(
            CommandMapper::map(&pad(&[], &[Button::Start])).mode_cmd,
            Some(ModeCommand::PosReset)
        );
        assert_eq!(CommandMapper::map(&pad(&[], &[])).mode_cmd, None);
    }

    #[test]
    fn test_modifier_required() {
        assert_eq!(CommandMapper::map(&pad(&[], &[Button::A])).mode_cmd, None);
        assert_eq!(
            CommandMapper::map(&pad(&[Button::R1], &[Button::A])).mode_cmd,
            Some(ModeCommand::Loco)
        );
        assert_eq!(
            CommandMapper::map(&pad(&[Button::R1], &[Button::X])).mode_cmd,
            Some(ModeCommand::Skill1)
        );
        assert_eq!(
            CommandMapper::map(&pad(&[Button::R1], &[Button::B])).mode_cmd,
            Some(ModeCommand::Skill3)
        );
    }

    #[test]
    fn test_last_matching_chord_wins() {
        // R1+Y and L1+Y both match; SKILL_4 is later in the table.
        let both = pad(&[Button::R1, Button::L1], &[Button::Y]);
        assert_eq!(CommandMapper::map(&both).mode_cmd, Some(ModeCommand::Skill4));

        // L3 and START released together: POS_RESET is later.
        let pair = pad(&[], &[Button::L3, Button::Start]);
        assert_eq!(CommandMapper::map(&pair).mode_cmd, Some(ModeCommand::PosReset));

        let only_r1 = pad(&[Button::R1], &[Button::Y]);
        assert_eq!(CommandMapper::map(&only_r1).mode_cmd, Some(ModeCommand::Skill2));
    }

    #[test]
    fn test_velocity_sign_mapping() {
        let mut device = pad(&[], &[]);
        device.axes = [0.25, -1.0, 0.9, 0.5];
        let cmd = CommandMapper::map(&device);
        assert!((cmd.velocity_cmd[0] - 1.0).abs() < f32::EPSILON);
        assert!((cmd.velocity_cmd[1] + 0.25).abs() < f32::EPSILON);
        assert!((cmd.velocity_cmd[2] + 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_non_finite_axis_replaced() {
        let mut device = pad(&[], &[]);
        device.axes = [f32::NAN, 0.5, 0.0, f32::INFINITY];
        let cmd = CommandMapper::map(&device);
        assert!(cmd.velocity_cmd.iter().all(|v| v.is_finite()));
        assert!(cmd.velocity_cmd[1].abs() < f32::EPSILON);
        assert_eq!(cmd.non_finite_axis, Some(0));
    }

    #[test]
    fn test_exit_is_level_triggered() {
        assert!(CommandMapper::map(&pad(&[Button::Select], &[])).exit_requested);
        assert!(!CommandMapper::map(&pad(&[], &[Button::Select])).exit_requested);
    }
}
