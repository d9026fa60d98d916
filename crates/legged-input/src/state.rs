//! Edge-tracking input state shared by every device.

/// Button, axis and hat state for one device.
///
/// Sizes are fixed at construction. [`apply`](Self::apply) is the only
/// mutator and derives `released` as the falling edge of `pressed`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    pressed: Vec<bool>,
    released: Vec<bool>,
    axes: Vec<f32>,
    hats: Vec<(i8, i8)>,
}

impl InputState {
    /// Create a neutral state with the given dimensions.
    pub fn new(button_count: usize, axis_count: usize, hat_count: usize) -> Self {
        Self {
            pressed: vec![false; button_count],
            released: vec![false; button_count],
            axes: vec![0.0; axis_count],
            hats: vec![(0, 0); hat_count],
        }
    }

    /// Apply one sample.
    ///
    /// `button(i)` reports whether button `i` is held now. Axis values are
    /// clamped to `[-1.0, 1.0]`; non-finite values are stored as-is so the
    /// caller can detect them. Missing trailing axes or hats keep their
    /// previous values.
    pub fn apply(&mut self, button: impl Fn(usize) -> bool, axes: &[f32], hats: &[(i8, i8)]) {
        for (i, (held, released)) in self
            .pressed
            .iter_mut()
            .zip(self.released.iter_mut())
            .enumerate()
        {
            let now = button(i);
            *released = *held && !now;
            *held = now;
        }

        for (slot, value) in self.axes.iter_mut().zip(axes) {
            *slot = if value.is_finite() {
                value.clamp(-1.0, 1.0)
            } else {
                *value
            };
        }

        for (slot, (x, y)) in self.hats.iter_mut().zip(hats) {
            *slot = ((*x).clamp(-1, 1), (*y).clamp(-1, 1));
        }
    }

    /// Re-apply the current held state, clearing every release edge.
    pub fn hold(&mut self) {
        for released in &mut self.released {
            *released = false;
        }
    }

    /// Whether button `index` is held.
    pub fn is_pressed(&self, index: usize) -> bool {
        self.pressed.get(index).copied().unwrap_or(false)
    }

    /// Whether button `index` was released on the last update.
    pub fn is_released(&self, index: usize) -> bool {
        self.released.get(index).copied().unwrap_or(false)
    }

    /// Axis value, `0.0` when out of range.
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    /// Hat direction, `(0, 0)` when out of range.
    pub fn hat(&self, index: usize) -> (i8, i8) {
        self.hats.get(index).copied().unwrap_or((0, 0))
    }

    /// Number of buttons.
    pub fn button_count(&self) -> usize {
        self.pressed.len()
    }

    /// Number of axes.
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of hats.
    pub fn hat_count(&self) -> usize {
        self.hats.len()
    }
}
