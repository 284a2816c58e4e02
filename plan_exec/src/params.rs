//! # Planner Parameters
//!
//! Aggregates the parameters of every planner module so a whole configuration can be loaded from
//! one file, for example `params/planner.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{
    exec::ExecParams, map::MapParams, mdp::MdpParams, motion::MotionParams, noise::ForwardNoise,
    search::SearchParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerParams {
    pub map: MapParams,

    pub motion: MotionParams,

    pub search: SearchParams,

    pub mdp: MdpParams,

    /// Noise on forward actions, shared by the MDP model and the executor
    pub noise: ForwardNoise,

    pub exec: ExecParams,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
