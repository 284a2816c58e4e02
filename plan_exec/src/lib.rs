//! # Grid Planner Library
//!
//! Motion planning for a wheeled base on a 2D occupancy grid. The map is inflated by the robot's
//! footprint, then either searched for a sequence of continuous controls (A*) or solved as an MDP
//! for a policy over discrete states, which is executed with the same motion noise it was planned
//! against.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Discrete states, actions and motions
pub mod discrete;

/// Execution of plans and policies on a base
pub mod exec;

/// Occupancy grids, inflation and the inflation cache
pub mod map;

/// Value iteration planner
pub mod mdp;

/// Kinematic motion model and collision checking
pub mod motion;

/// Noise model of forward actions
pub mod noise;

/// Parameters of all planner modules
pub mod params;

/// Goals and planning requests
pub mod request;

/// A* search planner
pub mod search;
