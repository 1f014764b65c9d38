//! The controller task: samples a Cartesian trajectory, computes a
//! joint-velocity command from the current joint state, and writes it to
//! the outbound channel at a fixed period.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nalgebra::{Matrix3, Vector3};
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::codec::{pack3, unpack3};
use crate::robot::RobotModel;
use crate::trajectory::{Trajectory, Waypoint};

/// Control law used to turn a trajectory sample into a joint-velocity
/// command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStrategy {
    Feedforward,
    Analytical,
}

/// The threshold below which `det(J Jᵀ)` is treated as singular.
const SINGULARITY_THRESHOLD: f64 = 1e-3;

fn parse_waypoints(path: &str) -> Vec<Waypoint> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(%path, error = %err, "could not read waypoint file");
            return Vec::new();
        }
    };

    let mut waypoints = Vec::new();
    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            break;
        }
        let parsed: Option<Vec<f64>> = fields.iter().map(|f| f.parse::<f64>().ok()).collect();
        match parsed {
            Some(values) => waypoints.push(Waypoint::new(values[0], values[1], values[2], values[3])),
            None => break,
        }
    }

    if waypoints.is_empty() {
        warn!(%path, "fewer than one waypoint loaded, control will always return zero");
    }
    waypoints
}

/// Samples a trajectory against the current joint state and produces a
/// joint-velocity command. Holds a `RobotModel` purely to query forward
/// kinematics and the Jacobian at caller-supplied joint vectors; it never
/// integrates and is never the model the plant owns.
pub struct Controller {
    trajectory: Mutex<Trajectory>,
    robot: RobotModel,
    strategy: ControlStrategy,
    period_ms: u64,
    alpha_scale: f64,
    control_signal: Mutex<Vector3<f64>>,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    pub fn new(waypoints_path: &str, robot: RobotModel, strategy: ControlStrategy) -> Self {
        Self::with_period(waypoints_path, robot, strategy, 20, 0.01)
    }

    pub fn with_period(
        waypoints_path: &str,
        robot: RobotModel,
        strategy: ControlStrategy,
        period_ms: u64,
        alpha_scale: f64,
    ) -> Self {
        let waypoints = parse_waypoints(waypoints_path);
        Self {
            trajectory: Mutex::new(Trajectory::new(waypoints)),
            robot,
            strategy,
            period_ms: period_ms.max(20),
            alpha_scale,
            control_signal: Mutex::new(Vector3::zeros()),
            stop: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.trajectory.lock().expect("trajectory mutex poisoned").waypoints().to_vec()
    }

    pub fn control_signal(&self) -> Vector3<f64> {
        *self.control_signal.lock().expect("control signal mutex poisoned")
    }

    /// Sample the trajectory at `t` against joint state `q` and cache the
    /// resulting control signal.
    pub fn compute_velocity_control(&self, q: &Vector3<f64>, t: f64) {
        let signal = match self.strategy {
            ControlStrategy::Feedforward => self.feedforward_control(q, t),
            ControlStrategy::Analytical => self.analytical_control(q, t),
        };
        *self.control_signal.lock().expect("control signal mutex poisoned") = signal;
    }

    fn feedforward_control(&self, q: &Vector3<f64>, t: f64) -> Vector3<f64> {
        let x = self.robot.forward_kinematics(q);
        let mut trajectory = self.trajectory.lock().expect("trajectory mutex poisoned");
        if !trajectory.update(t) {
            return Vector3::zeros();
        }
        let (x_d, v_d) = (trajectory.x, trajectory.v);
        drop(trajectory);

        let dx = x_d - x;
        let v = v_d + dx;

        let j = self.robot.jacob(q);
        let jjt = j * j.transpose();
        let w = jjt.determinant();
        let alpha = if w >= SINGULARITY_THRESHOLD {
            0.0
        } else {
            warn!(w, "approaching a kinematic singularity, applying damping bias");
            self.alpha_scale * (1.0 - w / SINGULARITY_THRESHOLD).powi(2)
        };
        let l = Matrix3::identity() * alpha;
        let pinv = match (jjt + l).try_inverse() {
            Some(inv) => j.transpose() * inv,
            None => return Vector3::zeros(),
        };

        let q_dot_bias = Vector3::new(5.0, 5.0, 5.0);
        let identity = Matrix3::<f64>::identity();
        pinv * v + (identity - pinv * j) * q_dot_bias
    }

    fn analytical_control(&self, q: &Vector3<f64>, t: f64) -> Vector3<f64> {
        let dt = self.period_ms as f64 / 1000.0;
        let mut trajectory = self.trajectory.lock().expect("trajectory mutex poisoned");
        if !trajectory.update(t) {
            return Vector3::zeros();
        }
        let x_d = trajectory.x;
        drop(trajectory);

        let q_d = self.robot.inverse_kinematics(x_d[0], x_d[1], x_d[2]);
        (q_d - q) / dt
    }

    /// Spawn the control loop: read joint state from `inbound`, write
    /// control signals to `outbound`.
    pub fn start(self: &Arc<Self>, inbound: Arc<Channel>, outbound: Arc<Channel>) {
        let controller = Arc::clone(self);
        let stop = Arc::clone(&self.stop);
        let period = Duration::from_millis(self.period_ms);

        let join = thread::spawn(move || {
            outbound.open();
            info!("controller loop starting, waiting for plant channel");
            while !inbound.is_open() {
                if stop.load(Ordering::Acquire) {
                    outbound.close();
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }

            let t0 = Instant::now();
            info!("controller loop running");
            while inbound.is_open() && !stop.load(Ordering::Acquire) {
                let q = unpack3(&inbound.receive());
                let elapsed = t0.elapsed().as_secs_f64();
                controller.compute_velocity_control(&q, elapsed);
                let signal = controller.control_signal();
                debug!(?signal, elapsed, "controller tick");
                outbound.send(&pack3(&signal));
                thread::sleep(period);
            }

            outbound.close();
            info!("controller loop stopped");
        });

        *self.handle.lock().expect("handle mutex poisoned") = Some(join);
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.handle.lock().expect("handle mutex poisoned").take() {
            let _ = join.join();
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}
