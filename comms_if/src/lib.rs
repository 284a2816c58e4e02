//! # Communications interface crate.
//!
//! Provides the messages exchanged between the planner and its collaborators: the map, pose and
//! goal sources on the way in, and the velocity command consumer on the way out.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions
pub mod msg;
