//! # Policy Executor
//!
//! Executes plans on a base. Search plans are dispatched as paced continuous commands. MDP
//! policies are executed in closed loop: the live pose is read, the policy's action looked up
//! and perturbed by the motion noise, and the resulting motion dispatched, until the goal is
//! reached.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod dispatch;
mod params;
pub mod sim;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use dispatch::{dispatch_controls, dispatch_discrete, ControlSink};
pub use params::ExecParams;
pub use state::{next_action, next_motion, ExecOutput, InitData, PolicyExec, StatusReport};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::{
    discrete::DiscreteState,
    motion::Pose,
    noise::InvalidNoise,
};
use dispatch::seconds;
use util::module::State;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which reports the base's current pose, such as an odometry subscriber.
pub trait PoseSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn current_pose(&mut self) -> Result<Pose, Self::Error>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Summary of a policy execution run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunReport {
    pub goal_reached: bool,

    /// Number of motions executed
    pub num_steps: usize,

    /// Number of commands sent to the base
    pub num_cmds: usize,

    /// The last state read from the base
    pub final_state: DiscreteState,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("The executor has not been initialised with a policy")]
    NotInitialised,

    #[error("Cannot execute an empty policy")]
    EmptyPolicy,

    #[error("The policy has no action for state {0}")]
    NoPolicyForState(DiscreteState),

    #[error(transparent)]
    InvalidNoise(#[from] InvalidNoise),

    #[error("Could not read the pose: {0}")]
    PoseSource(Box<dyn std::error::Error + Send + Sync>),

    #[error("Could not send a command: {0}")]
    Sink(Box<dyn std::error::Error + Send + Sync>),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute an initialised policy on the base until the goal is reached or `max_steps` motions
/// have been executed.
///
/// Each motion's command is sent `discrete_repeats` times, then the base is given time to settle
/// before its pose is read again.
pub fn run_policy<R, B>(exec: &mut PolicyExec<R>, base: &mut B) -> Result<RunReport, ExecError>
where
    R: Rng,
    B: PoseSource + ControlSink,
{
    let dwell = seconds(exec.params.dwell_s);
    let settle = seconds(exec.params.settle_s);
    let repeats = exec.params.discrete_repeats;
    let max_steps = exec.params.max_steps;

    let mut num_cmds = 0;

    loop {
        let pose = PoseSource::current_pose(base).map_err(|e| ExecError::PoseSource(Box::new(e)))?;

        let (output, report) = exec.proc(&pose)?;

        let motion = match output {
            ExecOutput::GoalReached(state) => {
                return Ok(RunReport {
                    goal_reached: true,
                    num_steps: report.num_steps,
                    num_cmds,
                    final_state: state,
                })
            }
            ExecOutput::Execute { motion, .. } => motion,
        };

        if report.num_steps > max_steps {
            warn!("Goal not reached within {} steps", max_steps);
            return Ok(RunReport {
                goal_reached: false,
                num_steps: max_steps,
                num_cmds,
                final_state: DiscreteState::from_pose(&pose),
            });
        }

        num_cmds += dispatch_discrete(base, &[motion], dwell, repeats)
            .map_err(|e| ExecError::Sink(Box::new(e)))?;
        ControlSink::settle(base, settle).map_err(|e| ExecError::Sink(Box::new(e)))?;

        if report.slipped {
            info!("Motion slipped to {:?}", motion);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::discrete::{DiscreteAction, Heading};
    use crate::map::{inflate, InflatedGrid, MapParams, OccupancyGrid};
    use crate::mdp::{MdpParams, MdpPlanner, PolicyTable};
    use crate::motion::{MotionModel, MotionParams};
    use crate::noise::ForwardNoise;
    use crate::request::Goal;
    use rand::rngs::mock::StepRng;
    use sim::SimBase;

    fn free_map() -> InflatedGrid {
        inflate(
            &OccupancyGrid::new_free(200, 200, 0.05).unwrap(),
            &MapParams::default(),
        )
        .unwrap()
    }

    fn motion() -> MotionModel {
        MotionModel::new(MotionParams::default()).unwrap()
    }

    /// Executor whose noise samples are always zero, so every action is executed nominally.
    fn nominal_exec(policy: PolicyTable, goal: Goal, max_steps: usize) -> PolicyExec<StepRng> {
        let params = ExecParams {
            max_steps,
            ..Default::default()
        };
        let mut exec =
            PolicyExec::with_rng(params, ForwardNoise::default(), 0.25, StepRng::new(0, 0)).unwrap();
        exec.init(InitData { policy, goal }).unwrap();
        exec
    }

    #[test]
    fn test_run_policy_to_goal() {
        let map = free_map();
        let goal = Goal::new(1.0, 8.0);
        let mdp = MdpPlanner::new(MdpParams::default(), motion(), ForwardNoise::default()).unwrap();
        let policy = mdp.plan(&map, &goal).policy;

        let mut exec = nominal_exec(policy, goal, 1000);
        let mut base = SimBase::new(&map, motion(), Pose::new(1.0, 1.0, 0.0), false);

        let report = run_policy(&mut exec, &mut base).unwrap();
        assert!(report.goal_reached);
        assert_eq!(report.final_state.x, 1);
        assert_eq!(report.final_state.y, 8);
        assert_eq!(report.num_steps, 11);
        assert_eq!(report.num_cmds, 22);
        assert_eq!(base.num_cmds(), 22);
    }

    #[test]
    fn test_run_policy_step_limit() {
        let map = free_map();

        // Spin on the spot forever
        let mut policy = PolicyTable::new();
        for h in Heading::ALL.iter() {
            policy.insert(DiscreteState::new(5, 5, *h), DiscreteAction::TurnLeft);
        }

        let mut exec = nominal_exec(policy, Goal::new(1.0, 8.0), 10);
        let mut base = SimBase::new(&map, motion(), Pose::new(5.0, 5.0, 0.0), false);

        let report = run_policy(&mut exec, &mut base).unwrap();
        assert!(!report.goal_reached);
        assert_eq!(report.num_steps, 10);
        assert_eq!(report.num_cmds, 20);
        assert_eq!(report.final_state.x, 5);
    }

    #[test]
    fn test_run_policy_errors() {
        let map = free_map();

        // Policy drives straight into the wall
        let mut policy = PolicyTable::new();
        for x in 0..11 {
            policy.insert(DiscreteState::new(x, 5, Heading::East), DiscreteAction::Forward);
        }

        let mut exec = nominal_exec(policy.clone(), Goal::new(1.0, 8.0), 100);
        let mut base = SimBase::new(&map, motion(), Pose::new(5.0, 5.0, 0.0), false);
        assert!(matches!(run_policy(&mut exec, &mut base), Err(ExecError::Sink(_))));

        // Starting off the policy
        let mut exec = nominal_exec(policy, Goal::new(1.0, 8.0), 100);
        let mut base = SimBase::new(&map, motion(), Pose::new(5.0, 4.0, 0.0), false);
        assert!(matches!(
            run_policy(&mut exec, &mut base),
            Err(ExecError::NoPolicyForState(_))
        ));
    }
}
