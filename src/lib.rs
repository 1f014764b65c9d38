//! Closed-loop kinematic control for a 3-DoF R-RR manipulator: a
//! controller task samples a Cartesian trajectory and drives a
//! simulated plant task over a pair of single-slot channels.

pub mod angle;
pub mod channel;
pub mod codec;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod joint;
pub mod plant;
pub mod robot;
pub mod trajectory;

pub use channel::Channel;
pub use config::Config;
pub use controller::{Controller, ControlStrategy};
pub use plant::Plant;
pub use robot::RobotModel;
