//! Key snapshot producers for the emulated gamepad.

use std::collections::{BTreeMap, VecDeque};
use std::io::stdout;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use legged_errors::DeviceError;

use crate::keyboard::{Key, KeySnapshot};

/// Refreshes a [`KeySnapshot`] from some keyboard source.
pub trait KeyPump {
    /// Bring `snapshot` up to date. Must not block.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Backend`] when the source cannot be read.
    fn pump(&mut self, snapshot: &mut KeySnapshot) -> Result<(), DeviceError>;
}

/// Pump that replays a fixed sequence of held-key frames.
///
/// Each pump consumes one frame; once exhausted the last frame stays held.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeyPump {
    frames: VecDeque<Vec<Key>>,
}

impl ScriptedKeyPump {
    /// Create a pump from frames of held keys.
    pub fn new<F, K>(frames: F) -> Self
    where
        F: IntoIterator<Item = K>,
        K: IntoIterator<Item = Key>,
    {
        Self {
            frames: frames
                .into_iter()
                .map(|frame| frame.into_iter().collect())
                .collect(),
        }
    }

    /// Queue another frame.
    pub fn push_frame(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.frames.push_back(keys.into_iter().collect());
    }

    /// Frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl KeyPump for ScriptedKeyPump {
    fn pump(&mut self, snapshot: &mut KeySnapshot) -> Result<(), DeviceError> {
        if let Some(frame) = self.frames.pop_front() {
            snapshot.set(frame);
        }
        Ok(())
    }
}

/// Terminal keyboard pump built on `crossterm`.
///
/// Puts the terminal in raw mode for its lifetime. When the terminal supports
/// the keyboard enhancement protocol, key release events are reported and
/// used directly. Otherwise releases are inferred from the autorepeat
/// stream:
///
/// - a key that has not repeated yet stays held for `initial_hold`, which
///   covers the OS autorepeat delay;
/// - once repeating it stays held until no report has arrived for
///   `repeat_hold`;
/// - terminals only repeat the most recent key, so a key pressed earlier
///   stays held while a newer key is held, and restarts its initial window
///   when that newer key is released.
///
/// Raw mode swallows SIGINT, so Ctrl+C is translated into the optional
/// interrupt flag instead.
#[derive(Debug)]
pub struct TerminalKeyPump {
    enhanced: bool,
    initial_hold: Duration,
    repeat_hold: Duration,
    held: BTreeMap<Key, HeldKey>,
    interrupt: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    pressed_at: Instant,
    last_seen: Instant,
    repeating: bool,
}

impl HeldKey {
    fn new(now: Instant) -> Self {
        Self {
            pressed_at: now,
            last_seen: now,
            repeating: false,
        }
    }

    fn expired(&self, now: Instant, initial_hold: Duration, repeat_hold: Duration) -> bool {
        let window = if self.repeating { repeat_hold } else { initial_hold };
        now.saturating_duration_since(self.last_seen) >= window
    }

    fn restart(&mut self, now: Instant) {
        self.last_seen = now;
        self.repeating = false;
    }
}

impl TerminalKeyPump {
    /// Default hold before the first autorepeat; above the common 250-660 ms
    /// OS delays.
    pub const DEFAULT_INITIAL_HOLD: Duration = Duration::from_millis(700);

    /// Default hold between autorepeats.
    pub const DEFAULT_REPEAT_HOLD: Duration = Duration::from_millis(150);

    /// Enter raw mode and start reading keys.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Backend`] when the terminal cannot be configured.
    pub fn new() -> Result<Self, DeviceError> {
        terminal::enable_raw_mode().map_err(DeviceError::backend)?;

        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )
            .map_err(DeviceError::backend)?;
        } else {
            tracing::warn!(
                initial_hold = ?Self::DEFAULT_INITIAL_HOLD,
                repeat_hold = ?Self::DEFAULT_REPEAT_HOLD,
                "terminal does not report key releases; releases are inferred from autorepeat"
            );
        }

        Ok(Self::with_mode(enhanced))
    }

    fn with_mode(enhanced: bool) -> Self {
        Self {
            enhanced,
            initial_hold: Self::DEFAULT_INITIAL_HOLD,
            repeat_hold: Self::DEFAULT_REPEAT_HOLD,
            held: BTreeMap::new(),
            interrupt: None,
        }
    }

    /// Set `flag` when Ctrl+C is typed.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Override the inferred-release windows.
    pub fn with_hold_windows(mut self, initial: Duration, repeat: Duration) -> Self {
        self.initial_hold = initial;
        self.repeat_hold = repeat;
        self
    }

    /// Whether key release events are reported by the terminal.
    pub fn reports_releases(&self) -> bool {
        self.enhanced
    }

    fn handle(&mut self, event: KeyEvent, now: Instant) {
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            if let Some(flag) = &self.interrupt {
                flag.store(true, Ordering::Release);
            }
            return;
        }

        let Some(key) = map_key_code(event.code) else {
            return;
        };
        let shift = event.modifiers.contains(KeyModifiers::SHIFT);

        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.seen(key, now);
                if shift {
                    self.seen(Key::Shift, now);
                } else {
                    self.held.remove(&Key::Shift);
                }
            }
            KeyEventKind::Release => {
                self.held.remove(&key);
                if !shift {
                    self.held.remove(&Key::Shift);
                }
            }
        }
    }

    fn seen(&mut self, key: Key, now: Instant) {
        self.held
            .entry(key)
            .and_modify(|held| {
                held.last_seen = now;
                held.repeating = true;
            })
            .or_insert_with(|| HeldKey::new(now));
    }

    /// Drop keys whose release can be inferred at `now`.
    fn expire(&mut self, now: Instant) {
        let mut newest_first: Vec<(Instant, Key)> =
            self.held.iter().map(|(key, held)| (held.pressed_at, *key)).collect();
        newest_first.sort_unstable_by(|a, b| b.cmp(a));

        let mut newer_held = false;
        let mut newer_dropped = false;
        for (_, key) in newest_first {
            let Some(held) = self.held.get_mut(&key) else {
                continue;
            };
            if newer_dropped && !newer_held {
                held.restart(now);
            }
            if !newer_held && held.expired(now, self.initial_hold, self.repeat_hold) {
                self.held.remove(&key);
                newer_dropped = true;
            } else {
                newer_held = true;
            }
        }
    }

    fn refresh(&mut self, snapshot: &mut KeySnapshot, now: Instant) {
        if !self.enhanced {
            self.expire(now);
        }
        snapshot.set(self.held.keys().copied());
    }
}

impl KeyPump for TerminalKeyPump {
    fn pump(&mut self, snapshot: &mut KeySnapshot) -> Result<(), DeviceError> {
        let now = Instant::now();
        while event::poll(Duration::ZERO).map_err(DeviceError::backend)? {
            if let Event::Key(key_event) = event::read().map_err(DeviceError::backend)? {
                self.handle(key_event, now);
            }
        }
        self.refresh(snapshot, now);
        Ok(())
    }
}

impl Drop for TerminalKeyPump {
    fn drop(&mut self) {
        if self.enhanced
            && let Err(e) = execute!(stdout(), PopKeyboardEnhancementFlags)
        {
            tracing::debug!(error = %e, "failed to restore keyboard flags");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::debug!(error = %e, "failed to leave raw mode");
        }
    }
}

fn map_key_code(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => Some(Key::char(c)),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        _ => None,
    }
}
