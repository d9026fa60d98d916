//! Physical HID gamepad.

use legged_errors::DeviceError;

use crate::device::{DeviceKind, InputDevice};
use crate::report::{GamepadReport, REPORT_AXES, REPORT_BUTTONS};
use crate::state::InputState;

pub use backend::HidApiSource;

/// Upper bound on reports drained per update.
const MAX_REPORTS_PER_UPDATE: usize = 16;

/// A byte-level source of gamepad input reports.
pub trait GamepadSource {
    /// Read at most one input report into `buf`. Returns the report length,
    /// or 0 when nothing new arrived.
    ///
    /// With `wait` set the read may block for a bounded timeout; without it
    /// the read must return immediately. [`HidGamepad`] waits on the first
    /// read of an update only, so one update blocks for at most one timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Disconnected`] when the device went away.
    fn read_report(&mut self, buf: &mut [u8], wait: bool) -> Result<usize, DeviceError>;

    /// Human-readable device name for logs.
    fn name(&self) -> &str {
        "gamepad"
    }
}

/// Gamepad backed by a [`GamepadSource`].
///
/// Each update drains the pending reports and keeps the newest complete one.
/// A report that is too short to decode leaves the previous sample in place.
#[derive(Debug)]
pub struct HidGamepad<S: GamepadSource> {
    source: S,
    state: InputState,
    last: GamepadReport,
    buf: [u8; 64],
}

impl<S: GamepadSource> HidGamepad<S> {
    /// Wrap an opened source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: InputState::new(REPORT_BUTTONS, REPORT_AXES, 1),
            last: GamepadReport::default(),
            buf: [0; 64],
        }
    }

    /// The most recent decoded report.
    pub fn last_report(&self) -> &GamepadReport {
        &self.last
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl HidGamepad<HidApiSource> {
    /// Open the first attached HID gamepad or joystick.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NoDevice`] when none is attached.
    pub fn open() -> Result<Self, DeviceError> {
        HidApiSource::open().map(Self::new)
    }
}

impl<S: GamepadSource> InputDevice for HidGamepad<S> {
    fn update(&mut self) -> Result<(), DeviceError> {
        for attempt in 0..MAX_REPORTS_PER_UPDATE {
            let n = match self.source.read_report(&mut self.buf, attempt == 0) {
                Ok(n) => n,
                Err(e) => {
                    self.state.hold();
                    return Err(e);
                }
            };
            if n == 0 {
                break;
            }
            match self.buf.get(..n).and_then(GamepadReport::parse) {
                Some(report) => self.last = report,
                None => tracing::trace!(len = n, "ignoring short gamepad report"),
            }
        }

        let report = self.last;
        let axes: [f32; REPORT_AXES] = core::array::from_fn(|i| report.axis_normalized(i));
        let hat = report.hat_direction().as_xy();
        self.state.apply(|i| report.button(i), &axes, &[hat]);
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
        DeviceKind::Physical
    }
}

#[cfg(feature = "hid")]
mod backend {
    use hidapi::{HidApi, HidDevice};
    use legged_errors::DeviceError;

    use super::GamepadSource;

    const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
    const USAGE_JOYSTICK: u16 = 0x04;
    const USAGE_GAMEPAD: u16 = 0x05;

    /// Timeout of the one waiting read per update.
    pub const READ_TIMEOUT_MS: i32 = 1;

    /// `hidapi`-backed report source.
    pub struct HidApiSource {
        // The device handle must not outlive the library context.
        _api: HidApi,
        device: HidDevice,
        name: String,
    }

    impl core::fmt::Debug for HidApiSource {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_struct("HidApiSource")
                .field("name", &self.name)
                .finish_non_exhaustive()
        }
    }

    impl HidApiSource {
        /// Open the first Generic Desktop joystick or gamepad.
        ///
        /// # Errors
        ///
        /// [`DeviceError::NoDevice`] when nothing matches,
        /// [`DeviceError::Backend`] when the HID stack fails.
        pub fn open() -> Result<Self, DeviceError> {
            let api = HidApi::new().map_err(DeviceError::backend)?;

            let info = api
                .device_list()
                .find(|d| {
                    d.usage_page() == USAGE_PAGE_GENERIC_DESKTOP
                        && matches!(d.usage(), USAGE_JOYSTICK | USAGE_GAMEPAD)
                })
                .ok_or(DeviceError::NoDevice)?;

            let name = info
                .product_string()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:04X}:{:04X}", info.vendor_id(), info.product_id()));
            let device = info.open_device(&api).map_err(DeviceError::backend)?;

            tracing::info!(device = %name, "opened HID gamepad");
            Ok(Self {
                _api: api,
                device,
                name,
            })
        }
    }

    impl GamepadSource for HidApiSource {
        fn read_report(&mut self, buf: &mut [u8], wait: bool) -> Result<usize, DeviceError> {
            let timeout = if wait { READ_TIMEOUT_MS } else { 0 };
            self.device
                .read_timeout(buf, timeout)
                .map_err(|e| DeviceError::Disconnected(format!("{}: {e}", self.name)))
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(not(feature = "hid"))]
mod backend {
    use legged_errors::DeviceError;

    use super::GamepadSource;

    /// Placeholder source used when HID support is compiled out; never opens.
    #[derive(Debug)]
    pub struct HidApiSource {
        _private: (),
    }

    impl HidApiSource {
        /// Always reports [`DeviceError::NoDevice`].
        ///
        /// # Errors
        ///
        /// Always.
        pub fn open() -> Result<Self, DeviceError> {
            Err(DeviceError::NoDevice)
        }
    }

    impl GamepadSource for HidApiSource {
        fn read_report(&mut self, _buf: &mut [u8], _wait: bool) -> Result<usize, DeviceError> {
            Err(DeviceError::NoDevice)
        }
    }
}
