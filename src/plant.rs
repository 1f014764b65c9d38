//! The plant task: owns and integrates a `RobotModel`, applies the
//! encoder quantization model, and exchanges joint/command frames with
//! the controller over a pair of channels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::channel::Channel;
use crate::codec::{pack3, quantize3, unpack3};
use crate::diagnostics::Sink;
use crate::robot::RobotModel;

/// Owns the integrated robot model and drives the plant-side control loop.
pub struct Plant {
    robot: Mutex<RobotModel>,
    command: Mutex<Vector3<f64>>,
    period_ms: u64,
    encoder_resolution: u32,
    sink: Mutex<Option<Box<dyn Sink + Send>>>,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Plant {
    pub fn new(robot: RobotModel) -> Self {
        Self::with_settings(robot, 1, 4096, None)
    }

    pub fn with_settings(
        robot: RobotModel,
        period_ms: u64,
        encoder_resolution: u32,
        sink: Option<Box<dyn Sink + Send>>,
    ) -> Self {
        Self {
            robot: Mutex::new(robot),
            command: Mutex::new(Vector3::zeros()),
            period_ms: period_ms.max(1),
            encoder_resolution,
            sink: Mutex::new(sink),
            stop: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn joints(&self) -> Vector3<f64> {
        self.robot.lock().expect("robot mutex poisoned").joints()
    }

    pub fn command(&self) -> Vector3<f64> {
        *self.command.lock().expect("command mutex poisoned")
    }

    /// Spawn the plant loop: read commands from `inbound`, write quantized
    /// joint state to `outbound`.
    pub fn start(self: &Arc<Self>, inbound: Arc<Channel>, outbound: Arc<Channel>) {
        let plant = Arc::clone(self);
        let stop = Arc::clone(&self.stop);
        let period = Duration::from_millis(self.period_ms);

        let join = thread::spawn(move || {
            outbound.open();
            info!("plant loop starting, waiting for controller channel");
            while !inbound.is_open() {
                if stop.load(Ordering::Acquire) {
                    outbound.close();
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }

            let mut t_prev = Instant::now();
            let mut elapsed = 0.0f64;
            info!("plant loop running");

            while inbound.is_open() && !stop.load(Ordering::Acquire) {
                let now = Instant::now();
                let dt = now.duration_since(t_prev).as_secs_f64();
                elapsed += dt;

                let command = *plant.command.lock().expect("command mutex poisoned");
                let (q, p) = {
                    let mut robot = plant.robot.lock().expect("robot mutex poisoned");
                    robot.update(&command, dt);
                    let q = robot.joints();
                    let p = robot.forward_kinematics(&q);
                    (q, p)
                };

                if let Some(sink) = plant.sink.lock().expect("sink mutex poisoned").as_mut() {
                    if let Err(err) = sink.save(&p, &command, &q, elapsed) {
                        tracing::warn!(error = %err, "failed to write diagnostic row");
                    }
                }

                debug!(?q, ?p, elapsed, "plant tick");
                let quantized = quantize3(&q, plant.encoder_resolution);
                outbound.send(&pack3(&quantized));

                let received = unpack3(&inbound.receive());
                *plant.command.lock().expect("command mutex poisoned") = received;

                t_prev = now;
                thread::sleep(period);
            }

            outbound.close();
            info!("plant loop stopped");
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

impl Drop for Plant {
    fn drop(&mut self) {
        self.stop();
    }
}
