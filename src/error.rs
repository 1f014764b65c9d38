//! Error taxonomy for the ambient (non-core) parts of the system:
//! configuration loading is the only thing in this crate allowed to fail
//! loudly. The kinematics/control/concurrency core never returns an error
//! (see SPEC_FULL.md §7); numerical degeneracy and malformed waypoint
//! lines are absorbed, not raised.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for config field {field}")]
    InvalidEnum { field: &'static str, value: String },
}
