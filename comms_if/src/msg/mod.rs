//! # Messages
//!
//! Plain data messages, serialisable to JSON so they can be recorded or replayed from file.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cmd;
mod goal;
mod map;
mod odom;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use cmd::TwistCmd;
pub use goal::GoalMsg;
pub use map::{OccupancyGridMsg, CELL_FREE, CELL_OCCUPIED, CELL_UNKNOWN};
pub use odom::OdometryMsg;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs, io, path::Path};

use serde::de::DeserializeOwned;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MsgError {
    #[error("Couldn't read the message file: {0}")]
    IoError(io::Error),

    #[error("Couldn't deserialize the message: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load a JSON encoded message from the given file.
pub fn load_json<M, P>(path: P) -> Result<M, MsgError>
where
    M: DeserializeOwned,
    P: AsRef<Path>,
{
    let s = fs::read_to_string(path).map_err(MsgError::IoError)?;
    serde_json::from_str(&s).map_err(MsgError::DeserializeError)
}
