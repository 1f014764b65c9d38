//! Forward and inverse kinematics for the R-RR (elbow) manipulator.
//!
//! DH parameters (link, alpha, a, d): (1, pi/2, 10, 0), (2, 0, 5, 0),
//! (3, 0, 5, 0).

use nalgebra::{Matrix3, Matrix4, Vector3};

use crate::joint::Joints;

const PI: f64 = std::f64::consts::PI;

/// Forward kinematics strategy: a closed-form solution specific to this
/// geometry, or the generic DH-matrix-product construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FkType {
    Fast,
    Generic,
}

/// Inverse kinematics strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IkType {
    Analytical,
    Transpose,
    Damped,
}

/// The 3-DoF R-RR arm: joint storage plus the kinematics operating on it.
#[derive(Debug, Clone)]
pub struct RobotModel {
    joints: Joints,
    fk: FkType,
    ik: IkType,
}

impl RobotModel {
    pub fn new() -> Self {
        Self {
            joints: Joints::new(),
            fk: FkType::Fast,
            ik: IkType::Analytical,
        }
    }

    pub fn with_joints(joints: Joints) -> Self {
        Self {
            joints,
            fk: FkType::Fast,
            ik: IkType::Analytical,
        }
    }

    /// A model whose joints carry explicit per-joint bounds instead of the
    /// defaults, as configured via `Config`.
    pub fn with_bounds(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::with_joints(Joints::with_bounds(min, max))
    }

    pub fn set_fk(&mut self, fk: FkType) {
        self.fk = fk;
    }

    pub fn set_ik(&mut self, ik: IkType) {
        self.ik = ik;
    }

    /// Current joint values as a vector.
    pub fn joints(&self) -> Vector3<f64> {
        let [q1, q2, q3] = self.joints.as_array();
        Vector3::new(q1, q2, q3)
    }

    /// End-effector position for the given joint configuration, using the
    /// currently selected forward-kinematics strategy.
    pub fn forward_kinematics(&self, q: &Vector3<f64>) -> Vector3<f64> {
        match self.fk {
            FkType::Fast => fast_forward_kinematics(q),
            FkType::Generic => forward_kinematics_generic(q),
        }
    }

    /// The 3x3 Jacobian (d position / d joints) at `q`.
    pub fn jacob(&self, q: &Vector3<f64>) -> Matrix3<f64> {
        let (s1, c1) = q[0].sin_cos();
        let (s2, c2) = q[1].sin_cos();
        let (s23, c23) = (q[1] + q[2]).sin_cos();

        Matrix3::new(
            -5.0 * s1 * (c23 + c2 + 2.0),
            -5.0 * c1 * (s23 + s2),
            -5.0 * c1 * s23,
            5.0 * c1 * (c23 + c2 + 2.0),
            -5.0 * s1 * (s23 + s2),
            -5.0 * s1 * s23,
            0.0,
            5.0 * (c23 + c2),
            5.0 * c23,
        )
    }

    /// Inverse kinematics for the target position, using the currently
    /// selected strategy. Never fails: returns the best-effort joint vector.
    pub fn inverse_kinematics(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        match self.ik {
            IkType::Analytical => self.analytical_ik(x, y, z),
            IkType::Transpose => self.jacob_transpose_ik(x, y, z, Vector3::zeros(), 1e-3),
            IkType::Damped => self.damped_ik(x, y, z, Vector3::zeros(), 1e-3),
        }
    }

    fn analytical_ik(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        let q1 = y.atan2(x);
        let c1 = q1.cos();
        let c1s = c1 * c1;
        let zs = z * z;
        let xs = x * x;

        let (q3, q2) = if c1s <= 1e-5 {
            // x ~= 0: theta1 degenerate, solve directly from z.
            let q3 = clamp_acos(0.5 * (2.0 + zs / 25.0));
            let (s3, c3) = q3.sin_cos();
            let q2 = clamp_asin((z * (1.0 + c3) / 5.0 + 2.0 * s3) / (2.0 + 2.0 * c3));
            (q3, q2)
        } else {
            let q3 = clamp_acos(0.5 * (2.0 + (xs + zs * c1s) / (25.0 * c1s) - 4.0 * x / (5.0 * c1)));
            let (s3, c3) = q3.sin_cos();
            let q2 = clamp_asin(
                (z * (1.0 + c3) / 5.0 - x * s3 / (5.0 * c1) + 2.0 * s3) / (2.0 + 2.0 * c3),
            );
            (q3, q2)
        };

        Vector3::new(q1, q2, q3)
    }

    fn jacob_transpose_ik(&self, x: f64, y: f64, z: f64, q0: Vector3<f64>, error: f64) -> Vector3<f64> {
        let target = Vector3::new(x, y, z);
        let mut q = q0;
        for _ in 0..100_000 {
            let current = self.forward_kinematics(&q);
            let dx = target - current;
            if dx.norm() <= error {
                return self.normalize_joints(q);
            }
            let j = self.jacob(&q);
            q += j.transpose() * dx * 0.01;
            q = self.normalize_joints(q);
        }
        q
    }

    fn damped_ik(&self, x: f64, y: f64, z: f64, q0: Vector3<f64>, error: f64) -> Vector3<f64> {
        let target = Vector3::new(x, y, z);
        let mut q = q0;
        for _ in 0..100_000 {
            let current = self.forward_kinematics(&q);
            let dx = target - current;
            if dx.norm() <= error {
                return self.normalize_joints(q);
            }
            let j = self.jacob(&q);
            let jjt = j * j.transpose();
            let l = Matrix3::identity() * 0.1;
            let inv = (jjt + l)
                .try_inverse()
                .unwrap_or_else(Matrix3::zeros);
            q += j.transpose() * inv * dx;
            q = self.normalize_joints(q);
        }
        q
    }

    /// Pass each component of `q` through a fresh set of joint bounds,
    /// mirroring the way the iterative IK loops re-normalize through the
    /// model's own `Angle` bounds after every step.
    fn normalize_joints(&self, q: Vector3<f64>) -> Vector3<f64> {
        let mut joints = self.joints;
        joints.q1.write(q[0]);
        joints.q2.write(q[1]);
        joints.q3.write(q[2]);
        Vector3::new(joints.q1.read(), joints.q2.read(), joints.q3.read())
    }

    /// Forward-Euler integration: `q_i <- q_i + u_i * dt`, normalized and
    /// clamped through each joint's own `Angle`.
    pub fn update(&mut self, u: &Vector3<f64>, dt: f64) {
        let q1 = self.joints.q1.read() + u[0] * dt;
        let q2 = self.joints.q2.read() + u[1] * dt;
        let q3 = self.joints.q3.read() + u[2] * dt;
        self.joints.q1.write(q1);
        self.joints.q2.write(q2);
        self.joints.q3.write(q3);
    }
}

impl Default for RobotModel {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_acos(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}

fn clamp_asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

fn fast_forward_kinematics(q: &Vector3<f64>) -> Vector3<f64> {
    let (c1, s1) = (q[0].cos(), q[0].sin());
    let c2 = q[1].cos();
    let s2 = q[1].sin();
    let c23 = (q[1] + q[2]).cos();
    let s23 = (q[1] + q[2]).sin();

    Vector3::new(
        5.0 * c1 * (2.0 + c2 + c23),
        5.0 * s1 * (2.0 + c2 + c23),
        5.0 * (s2 + s23),
    )
}

/// Homogeneous DH transform: rotate about Z by theta, translate `a` along
/// X, rotate about X by `alpha`, translate `d` along Z.
fn dh_transform(theta: f64, alpha: f64, a: f64, d: f64) -> Matrix4<f64> {
    let (st, ct) = theta.sin_cos();
    let (sa, ca) = alpha.sin_cos();

    Matrix4::new(
        ct, -st * ca, st * sa, a * ct,
        st, ct * ca, -ct * sa, a * st,
        0.0, sa, ca, d,
        0.0, 0.0, 0.0, 1.0,
    )
}

fn forward_kinematics_generic(q: &Vector3<f64>) -> Vector3<f64> {
    let t1 = dh_transform(q[0], PI / 2.0, 10.0, 0.0);
    let t2 = dh_transform(q[1], 0.0, 5.0, 0.0);
    let t3 = dh_transform(q[2], 0.0, 5.0, 0.0);
    let t = t1 * t2 * t3;
    Vector3::new(t[(0, 3)], t[(1, 3)], t[(2, 3)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const JOINTS_SET: [[f64; 3]; 9] = [
        [1.0, 0.75, 2.5],
        [-2.0, 0.5, 3.0],
        [1.25, 0.7, 2.0],
        [-1.0, 1.5, 3.1],
        [-3.1, 0.6, 1.5],
        [3.14, 1.57, 3.14],
        [-3.14, 1.57, 3.14],
        [-3.14, -1.57, 3.14],
        [-3.14, -1.57, -3.14],
    ];

    const SOLUTION_SET: [[f64; 3]; 9] = [
        [4.694, 7.311, 2.867],
        [-4.039, -8.825, 0.6432],
        [2.934, 8.829, 5.358],
        [5.291, -8.24, 0.019],
        [-11.59, -0.482, 7.139],
        [-9.992, 0.01591, 0.0],
        [-9.992, -0.01591, 0.0],
        [-10.01, -0.01594, 0.0],
        [-9.992, -0.01591, 0.0],
    ];

    #[test]
    fn e2_fast_fk() {
        let q = Vector3::new(1.0, 0.75, 2.5);
        let p = fast_forward_kinematics(&q);
        assert_relative_eq!(p[0], 4.694, epsilon = 1e-2);
        assert_relative_eq!(p[1], 7.311, epsilon = 1e-2);
        assert_relative_eq!(p[2], 2.867, epsilon = 1e-2);
    }

    #[test]
    fn fast_fk_matches_solution_set() {
        for (q, sol) in JOINTS_SET.iter().zip(SOLUTION_SET.iter()) {
            let p = fast_forward_kinematics(&Vector3::new(q[0], q[1], q[2]));
            assert_relative_eq!(p[0], sol[0], epsilon = 1e-2);
            assert_relative_eq!(p[1], sol[1], epsilon = 1e-2);
            assert_relative_eq!(p[2], sol[2], epsilon = 1e-2);
        }
    }

    #[test]
    fn p2_fk_equivalence() {
        for q in JOINTS_SET.iter() {
            let q = Vector3::new(q[0], q[1], q[2]);
            let fast = fast_forward_kinematics(&q);
            let generic = forward_kinematics_generic(&q);
            assert_relative_eq!(fast[0], generic[0], epsilon = 1e-2);
            assert_relative_eq!(fast[1], generic[1], epsilon = 1e-2);
            assert_relative_eq!(fast[2], generic[2], epsilon = 1e-2);
        }
    }

    #[test]
    fn p3_analytical_ik_round_trip() {
        let model = RobotModel::new();
        for sol in SOLUTION_SET.iter() {
            let q = model.analytical_ik(sol[0], sol[1], sol[2]);
            let p = model.forward_kinematics(&q);
            assert_relative_eq!(p[0], sol[0], epsilon = 1e-2);
            assert_relative_eq!(p[1], sol[1], epsilon = 1e-2);
            assert_relative_eq!(p[2], sol[2], epsilon = 1e-2);
        }
    }

    #[test]
    fn e3_analytical_ik_specific_target() {
        let model = RobotModel::new();
        let q = model.analytical_ik(-11.59, -0.482, 7.139);
        let p = model.forward_kinematics(&q);
        assert_relative_eq!(p[0], -11.59, epsilon = 1e-2);
        assert_relative_eq!(p[1], -0.482, epsilon = 1e-2);
        assert_relative_eq!(p[2], 7.139, epsilon = 1e-2);
    }

    #[test]
    fn p4_iterative_ik_round_trip_non_singular() {
        let mut model = RobotModel::new();
        for sol in SOLUTION_SET.iter().take(5) {
            model.set_ik(IkType::Transpose);
            let q = model.inverse_kinematics(sol[0], sol[1], sol[2]);
            let p = model.forward_kinematics(&q);
            assert_relative_eq!(p[0], sol[0], epsilon = 1e-2);
            assert_relative_eq!(p[1], sol[1], epsilon = 1e-2);
            assert_relative_eq!(p[2], sol[2], epsilon = 1e-2);

            model.set_ik(IkType::Damped);
            let q = model.inverse_kinematics(sol[0], sol[1], sol[2]);
            let p = model.forward_kinematics(&q);
            assert_relative_eq!(p[0], sol[0], epsilon = 1e-2);
            assert_relative_eq!(p[1], sol[1], epsilon = 1e-2);
            assert_relative_eq!(p[2], sol[2], epsilon = 1e-2);
        }
    }

    #[test]
    fn update_integrates_each_joint_independently() {
        let mut model = RobotModel::new();
        model.update(&Vector3::new(1.0, 2.0, 3.0), 0.1);
        let q = model.joints();
        assert_relative_eq!(q[0], 0.1, epsilon = 1e-9);
        assert_relative_eq!(q[1], 0.2, epsilon = 1e-9);
        assert_relative_eq!(q[2], 0.3, epsilon = 1e-9);
    }

    #[test]
    fn update_clamps_through_joint_bounds() {
        let mut model = RobotModel::new();
        // q2's bound is +/- pi/2; push it far past that.
        model.update(&Vector3::new(0.0, 10.0, 0.0), 1.0);
        let q = model.joints();
        assert_relative_eq!(q[1], PI / 2.0, epsilon = 1e-9);
    }
}
