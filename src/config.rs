//! The JSON configuration document (SPEC_FULL.md §4.8 / §6). Every
//! section and field is optional; a missing section yields the
//! documented defaults, matching the corpus's `serde`-onto-struct config
//! loaders (`horus_core`, `horus_manager`).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::controller::ControlStrategy;
use crate::error::ConfigError;
use crate::robot::{FkType, IkType};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    pub ik: String,
    pub fk: String,
    pub joints_min: [f64; 3],
    pub joints_max: [f64; 3],
}

impl Default for RobotSettings {
    fn default() -> Self {
        use std::f64::consts::PI;
        Self {
            ik: "analytical".to_string(),
            fk: "fast".to_string(),
            joints_min: [-PI, -PI / 2.0, -PI],
            joints_max: [PI, PI / 2.0, PI],
        }
    }
}

impl RobotSettings {
    pub fn fk_type(&self) -> Result<FkType, ConfigError> {
        match self.fk.as_str() {
            "fast" => Ok(FkType::Fast),
            "generic" => Ok(FkType::Generic),
            other => Err(ConfigError::InvalidEnum {
                field: "robot.fk",
                value: other.to_string(),
            }),
        }
    }

    pub fn ik_type(&self) -> Result<IkType, ConfigError> {
        match self.ik.as_str() {
            "analytical" => Ok(IkType::Analytical),
            "transpose" => Ok(IkType::Transpose),
            "damped" => Ok(IkType::Damped),
            other => Err(ConfigError::InvalidEnum {
                field: "robot.ik",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    pub frequency: u32,
    pub save_output: bool,
    pub encoder_resolution: u32,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            frequency: 1000,
            save_output: false,
            encoder_resolution: 4096,
        }
    }
}

impl SystemSettings {
    /// Plant loop period, derived from `frequency`, floored at 1ms.
    pub fn period_ms(&self) -> u64 {
        if self.frequency == 0 {
            1
        } else {
            (1000 / self.frequency as u64).max(1)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub frequency: u32,
    #[serde(rename = "type")]
    pub strategy: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            frequency: 50,
            strategy: "feedforward".to_string(),
        }
    }
}

impl ControlSettings {
    /// Controller loop period: `max(20ms, 1/frequency)`.
    pub fn period_ms(&self) -> u64 {
        if self.frequency == 0 {
            return 20;
        }
        (1000 / self.frequency as u64).max(20)
    }

    pub fn strategy(&self) -> Result<ControlStrategy, ConfigError> {
        match self.strategy.as_str() {
            "feedforward" => Ok(ControlStrategy::Feedforward),
            "analytical" => Ok(ControlStrategy::Analytical),
            other => Err(ConfigError::InvalidEnum {
                field: "control.type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub robot: RobotSettings,
    pub robot_system: SystemSettings,
    pub control: ControlSettings,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        // Validate the enum-shaped fields eagerly so a malformed config is
        // rejected at startup rather than surfacing mid-mission.
        config.robot.fk_type()?;
        config.robot.ik_type()?;
        config.control.strategy()?;
        Ok(config)
    }
}
