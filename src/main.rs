use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use remy_robot_control::channel::Channel;
use remy_robot_control::config::Config;
use remy_robot_control::controller::Controller;
use remy_robot_control::diagnostics::CsvSink;
use remy_robot_control::plant::Plant;
use remy_robot_control::robot::RobotModel;

/// Total wall time a standard mission runs before both loops are stopped.
const MISSION_DURATION: Duration = Duration::from_secs(11);

#[derive(Debug, Parser)]
#[command(name = "remy-robot-control")]
struct Args {
    /// Whitespace-delimited "x y z t" waypoint file.
    waypoints: String,
    /// JSON configuration document.
    config: String,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(&args.config)?;

    let mut robot = RobotModel::with_bounds(config.robot.joints_min, config.robot.joints_max);
    robot.set_fk(config.robot.fk_type()?);
    robot.set_ik(config.robot.ik_type()?);

    let controller = Arc::new(Controller::with_period(
        &args.waypoints,
        robot.clone(),
        config.control.strategy()?,
        config.control.period_ms(),
        0.01,
    ));

    let sink: Option<Box<dyn remy_robot_control::diagnostics::Sink + Send>> =
        if config.robot_system.save_output {
            Some(Box::new(CsvSink::create("remy_robot_control.csv")?))
        } else {
            None
        };

    let plant = Arc::new(Plant::with_settings(
        robot,
        config.robot_system.period_ms(),
        config.robot_system.encoder_resolution,
        sink,
    ));

    let controller_channel = Arc::new(Channel::new());
    let plant_channel = Arc::new(Channel::new());

    info!("starting mission");
    controller.start(Arc::clone(&plant_channel), Arc::clone(&controller_channel));
    plant.start(Arc::clone(&controller_channel), Arc::clone(&plant_channel));

    thread::sleep(MISSION_DURATION);

    controller.stop();
    plant.stop();
    info!("mission complete");

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("remy-robot-control: {err}");
            ExitCode::FAILURE
        }
    }
}
