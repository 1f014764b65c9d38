use std::f64::consts::PI;

use crate::angle::Angle;

/// The three revolute joints of the R-RR (elbow) arm, each owning its own
/// mechanical limits for the lifetime of the containing model.
#[derive(Debug, Clone, Copy)]
pub struct Joints {
    pub q1: Angle,
    pub q2: Angle,
    pub q3: Angle,
}

impl Joints {
    /// Joints at zero with the default bounds: q1 in (-pi, pi], q2 in
    /// (-pi/2, pi/2], q3 in (-pi, pi].
    pub fn new() -> Self {
        Self {
            q1: Angle::new(0.0, -PI, PI),
            q2: Angle::new(0.0, -PI / 2.0, PI / 2.0),
            q3: Angle::new(0.0, -PI, PI),
        }
    }

    /// Joints at zero with explicit per-joint bounds.
    pub fn with_bounds(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            q1: Angle::new(0.0, min[0], max[0]),
            q2: Angle::new(0.0, min[1], max[1]),
            q3: Angle::new(0.0, min[2], max[2]),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.q1.read(), self.q2.read(), self.q3.read()]
    }
}

impl Default for Joints {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_match_spec() {
        let j = Joints::new();
        assert_eq!(j.q1.min(), -PI);
        assert_eq!(j.q1.max(), PI);
        assert_eq!(j.q2.min(), -PI / 2.0);
        assert_eq!(j.q2.max(), PI / 2.0);
        assert_eq!(j.q3.min(), -PI);
        assert_eq!(j.q3.max(), PI);
    }

    #[test]
    fn custom_bounds_are_kept_per_joint() {
        let j = Joints::with_bounds([-1.0, -2.0, -3.0], [1.0, 2.0, 3.0]);
        assert_eq!(j.q1.min(), -1.0);
        assert_eq!(j.q2.max(), 2.0);
        assert_eq!(j.q3.min(), -3.0);
    }
}
