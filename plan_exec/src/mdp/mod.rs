//! # MDP Planner
//!
//! Plans a policy over the discrete domain which accounts for uncertainty in the robot's motion.
//! Value iteration is run over every discrete state on the map, then each state is assigned the
//! action with the highest expected return.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod policy;
pub mod value_iter;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::MdpParams;
pub use policy::{PolicyError, PolicyTable};
pub use value_iter::{MdpModel, StateSpace, StateValueTable, SweepReport};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use crate::{
    discrete::DiscreteState,
    map::InflatedGrid,
    motion::MotionModel,
    noise::{ForwardNoise, InvalidNoise},
    request::{Goal, PlanRequest},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MdpPlanner {
    params: MdpParams,

    motion: MotionModel,

    noise: ForwardNoise,
}

/// Result of an MDP plan.
#[derive(Debug, Clone)]
pub struct MdpReport {
    /// The action for every state in the state space
    pub policy: PolicyTable,

    /// Final values of every state
    pub values: StateValueTable,

    pub sweeps: SweepReport,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MdpError {
    #[error("Discount factor must be in [0, 1), found {0}")]
    InvalidDiscount(f64),

    #[error("Goal tolerance must be positive, found {0}")]
    InvalidGoalTolerance(f64),

    #[error("Convergence tolerance must be non-negative, found {0}")]
    InvalidConvergenceTol(f64),

    #[error("Distance penalty scale must be positive, found {0}")]
    InvalidPenaltyScale(f64),

    #[error(transparent)]
    InvalidNoise(#[from] InvalidNoise),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MdpPlanner {
    pub fn new(params: MdpParams, motion: MotionModel, noise: ForwardNoise) -> Result<Self, MdpError> {
        if !(0.0..1.0).contains(&params.discount) {
            return Err(MdpError::InvalidDiscount(params.discount));
        }
        if !(params.goal_tolerance_m > 0.0) {
            return Err(MdpError::InvalidGoalTolerance(params.goal_tolerance_m));
        }
        if !(params.convergence_tol >= 0.0) {
            return Err(MdpError::InvalidConvergenceTol(params.convergence_tol));
        }
        if !(params.distance_penalty_scale > 0.0) {
            return Err(MdpError::InvalidPenaltyScale(params.distance_penalty_scale));
        }
        noise.validate()?;

        Ok(Self {
            params,
            motion,
            noise,
        })
    }

    pub fn params(&self) -> &MdpParams {
        &self.params
    }

    pub fn noise(&self) -> &ForwardNoise {
        &self.noise
    }

    /// Plan a policy for the request. The policy covers every state on the map, the start is only
    /// used to report the first action.
    pub fn plan_request(&self, request: &PlanRequest) -> MdpReport {
        let report = self.plan(request.map, &request.goal);

        let start = DiscreteState::from_pose(&request.start);
        match report.policy.get(&start) {
            Some(a) => info!("Policy action at start state {}: {:?}", start, a),
            None => warn!("Start state {} is outside the policy's state space", start),
        }

        report
    }

    /// Plan a policy reaching the goal on the map.
    pub fn plan(&self, map: &InflatedGrid, goal: &Goal) -> MdpReport {
        info!(
            "Planning MDP policy to ({:.2}, {:.2}) on a {}x{} map",
            goal.position_m.x,
            goal.position_m.y,
            map.width(),
            map.height()
        );

        let model = MdpModel::build(map, &self.motion, &self.noise, &self.params, goal);

        let (values, sweeps) = value_iter::value_iteration(
            &model,
            self.params.max_sweeps,
            self.params.convergence_tol,
        );

        if sweeps.converged {
            info!(
                "Value iteration converged after {} sweeps (delta {:e})",
                sweeps.num_sweeps, sweeps.final_delta
            );
        } else {
            info!(
                "Value iteration stopped at the sweep limit of {} (delta {:e})",
                sweeps.num_sweeps, sweeps.final_delta
            );
        }

        let mut policy = PolicyTable::new();
        for (i, state) in model.space().iter().enumerate() {
            policy.insert(state, model.best_action(i, values.values()).0);
        }

        MdpReport {
            policy,
            values,
            sweeps,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::discrete::{DiscreteAction, DiscreteMotion, Heading};
    use crate::map::{inflate, MapParams, OccupancyGrid};
    use crate::motion::{MotionParams, Pose, Prediction};

    fn planner() -> MdpPlanner {
        MdpPlanner::new(
            MdpParams::default(),
            MotionModel::new(MotionParams::default()).unwrap(),
            ForwardNoise::default(),
        )
        .unwrap()
    }

    fn free_map() -> InflatedGrid {
        inflate(
            &OccupancyGrid::new_free(200, 200, 0.05).unwrap(),
            &MapParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_params() {
        let motion = MotionModel::new(MotionParams::default()).unwrap();
        let mut params = MdpParams::default();
        params.discount = 1.0;
        assert!(MdpPlanner::new(params, motion.clone(), ForwardNoise::default()).is_err());

        let noise = ForwardNoise {
            forward_prob: 0.5,
            arc_left_prob: 0.1,
            arc_right_prob: 0.1,
        };
        assert!(MdpPlanner::new(MdpParams::default(), motion, noise).is_err());
    }

    #[test]
    fn test_free_map_policy() {
        let map = free_map();
        let goal = Goal::new(1.0, 8.0);
        let report = planner().plan(&map, &goal);

        assert_eq!(report.sweeps.num_sweeps, 200);
        assert_eq!(report.policy.len(), 484);

        // States one nominal step from the goal drive into it
        for s in [
            DiscreteState::new(1, 7, Heading::North),
            DiscreteState::new(2, 8, Heading::West),
            DiscreteState::new(1, 9, Heading::South),
        ]
        .iter()
        {
            assert_eq!(report.policy.get(s), Some(DiscreteAction::Forward), "at {}", s);

            let motion = MotionModel::new(MotionParams::default()).unwrap();
            match motion.discrete_motion(&map, s, DiscreteMotion::Forward) {
                Prediction::Free(next) => assert!(goal.is_reached(
                    next.x as f64,
                    next.y as f64,
                    0.25
                )),
                Prediction::Collision => panic!("Forward from {} collides", s),
            }
        }

        // The goal is the most valuable position
        let at_goal = report.values.get(&DiscreteState::new(1, 8, Heading::North)).unwrap();
        for v in report.values.values() {
            assert!(*v <= at_goal + 1e-9);
        }
        assert!(at_goal > report.values.get(&DiscreteState::new(1, 7, Heading::North)).unwrap());
    }

    #[test]
    fn test_plan_request() {
        let map = free_map();
        let request = PlanRequest::new(&map, Pose::new(1.0, 7.0, std::f64::consts::FRAC_PI_2), Goal::new(1.0, 8.0));
        let report = planner().plan_request(&request);

        let start = DiscreteState::from_pose(&request.start);
        assert_eq!(report.policy.get(&start), Some(DiscreteAction::Forward));

        // The policy survives a round trip through JSON
        let table = PolicyTable::from_json(&report.policy.to_json().unwrap()).unwrap();
        assert_eq!(table, report.policy);
    }

    #[test]
    fn test_early_convergence() {
        let mut params = MdpParams::default();
        params.convergence_tol = 1e-2;
        let planner = MdpPlanner::new(
            params,
            MotionModel::new(MotionParams::default()).unwrap(),
            ForwardNoise::default(),
        )
        .unwrap();

        let report = planner.plan(&free_map(), &Goal::new(1.0, 8.0));
        assert!(report.sweeps.converged);
        assert!(report.sweeps.num_sweeps < 200);
        assert_eq!(
            report.policy.get(&DiscreteState::new(1, 7, Heading::North)),
            Some(DiscreteAction::Forward)
        );
    }
}
