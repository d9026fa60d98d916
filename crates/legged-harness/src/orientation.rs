//! IMU helpers.

/// Body-frame gravity direction for an orientation quaternion `[w, x, y, z]`.
///
/// An upright body yields `[0, 0, -1]`.
pub fn gravity_orientation(quat: [f32; 4]) -> [f32; 3] {
    let [w, x, y, z] = quat;
    [
        2.0 * (-z * x + w * y),
        -2.0 * (z * y + w * x),
        1.0 - 2.0 * (w * w + z * z),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_upright() {
        assert!(close(gravity_orientation([1.0, 0.0, 0.0, 0.0]), [0.0, 0.0, -1.0]));
    }

    #[test]
    fn test_yaw_does_not_tilt() {
        let half = core::f32::consts::FRAC_PI_4;
        let yaw_90 = [half.cos(), 0.0, 0.0, half.sin()];
        assert!(close(gravity_orientation(yaw_90), [0.0, 0.0, -1.0]));
    }

    #[test]
    fn test_pitch_90_tilts_into_x() {
        let half = core::f32::consts::FRAC_PI_4;
        let pitch_90 = [half.cos(), 0.0, half.sin(), 0.0];
        assert!(close(gravity_orientation(pitch_90), [1.0, 0.0, 0.0]));
    }
}
