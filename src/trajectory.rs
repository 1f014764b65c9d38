//! A piecewise-linear Cartesian trajectory sampled from time-stamped
//! waypoints. Not a spline: velocity is constant within each segment.

use nalgebra::Vector3;

/// One `(x, y, z, t)` record from the waypoint file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Piecewise-linear sampler over a sorted waypoint list.
#[derive(Debug, Clone)]
pub struct Trajectory {
    waypoints: Vec<Waypoint>,
    times: Vec<f64>,
    /// Current sampled position, valid after a successful `update`.
    pub x: Vector3<f64>,
    /// Current sampled (constant, per-segment) velocity.
    pub v: Vector3<f64>,
}

impl Trajectory {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        let times = waypoints.iter().map(|w| w.t).collect();
        Self {
            waypoints,
            times,
            x: Vector3::zeros(),
            v: Vector3::zeros(),
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Sample the trajectory at time `t`, updating `self.x`/`self.v` in
    /// place. Returns `false` (leaving `x`/`v` at their previous values) if
    /// `t` is past the last waypoint.
    pub fn update(&mut self, t: f64) -> bool {
        let index = match self.times.iter().position(|&ti| ti >= t) {
            Some(i) => i,
            None => return false,
        };

        let t0 = if index == 0 { 0.0 } else { self.times[index - 1] };
        let tf = self.times[index];
        let x0 = if index == 0 {
            Vector3::zeros()
        } else {
            self.waypoints[index - 1].position()
        };
        let xf = self.waypoints[index].position();

        if tf == t0 {
            self.v = Vector3::zeros();
            self.x = xf;
            return true;
        }

        self.v = (xf - x0) / (tf - t0);
        self.x = x0 + self.v * (t - t0);
        true
    }
}
