//! Implementations for the PolicyExec state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::TwistCmd;
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use super::{ExecError, ExecParams};
use crate::{
    discrete::{DiscreteAction, DiscreteMotion, DiscreteState},
    mdp::PolicyTable,
    motion::Pose,
    noise::ForwardNoise,
    request::Goal,
};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Stochastic policy executor.
///
/// Each cycle the live pose is discretised and looked up in the policy. Nominal forward actions
/// are resampled from the same noise model the policy was planned against.
pub struct PolicyExec<R = StdRng> {
    pub(crate) params: ExecParams,

    noise: ForwardNoise,

    goal_tolerance_m: f64,

    rng: R,

    policy: Option<PolicyTable>,

    goal: Option<Goal>,

    num_steps: usize,
}

/// Data needed to start executing a policy.
#[derive(Debug, Clone)]
pub struct InitData {
    pub policy: PolicyTable,
    pub goal: Goal,
}

/// Output of one execution cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExecOutput {
    /// The live state is at the goal, nothing more to do.
    GoalReached(DiscreteState),

    /// A motion to execute.
    Execute {
        state: DiscreteState,

        /// The policy's action for the state
        action: DiscreteAction,

        /// The motion after noise has been applied
        motion: DiscreteMotion,

        /// Command realising the motion
        cmd: TwistCmd,
    },
}

/// Status report for PolicyExec processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Number of motions executed so far
    pub num_steps: usize,

    /// True if the state is at the goal
    pub goal_reached: bool,

    /// True if noise changed the policy's action this cycle
    pub slipped: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl PolicyExec<StdRng> {
    /// Create a new executor, seeding the noise generator from `rng_seed` or from entropy.
    pub fn new(params: ExecParams, noise: ForwardNoise, goal_tolerance_m: f64) -> Result<Self, ExecError> {
        let rng = match params.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self::with_rng(params, noise, goal_tolerance_m, rng)
    }
}

impl<R: Rng> PolicyExec<R> {
    /// Create a new executor drawing noise from the given generator.
    pub fn with_rng(
        params: ExecParams,
        noise: ForwardNoise,
        goal_tolerance_m: f64,
        rng: R,
    ) -> Result<Self, ExecError> {
        noise.validate()?;

        Ok(Self {
            params,
            noise,
            goal_tolerance_m,
            rng,
            policy: None,
            goal: None,
            num_steps: 0,
        })
    }

    pub fn params(&self) -> &ExecParams {
        &self.params
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }
}

impl<R: Rng> State for PolicyExec<R> {
    type InitData = InitData;
    type InitError = ExecError;

    type InputData = Pose;
    type OutputData = ExecOutput;
    type StatusReport = StatusReport;
    type ProcError = ExecError;

    /// Load the policy and goal, resetting the step count.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        if init_data.policy.is_empty() {
            return Err(ExecError::EmptyPolicy);
        }

        info!(
            "Executing a policy over {} states to ({:.2}, {:.2})",
            init_data.policy.len(),
            init_data.goal.position_m.x,
            init_data.goal.position_m.y
        );

        self.policy = Some(init_data.policy);
        self.goal = Some(init_data.goal);
        self.num_steps = 0;

        Ok(())
    }

    /// Choose the motion for the live pose.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let (policy, goal) = match (&self.policy, &self.goal) {
            (Some(p), Some(g)) => (p, g),
            _ => return Err(ExecError::NotInitialised),
        };

        let state = DiscreteState::from_pose(input_data);
        let mut report = StatusReport {
            num_steps: self.num_steps,
            ..Default::default()
        };

        if goal.is_reached(state.x as f64, state.y as f64, self.goal_tolerance_m) {
            info!("Goal reached at {} after {} steps", state, self.num_steps);
            report.goal_reached = true;
            return Ok((ExecOutput::GoalReached(state), report));
        }

        let action = policy
            .get(&state)
            .ok_or(ExecError::NoPolicyForState(state))?;
        let motion = next_motion(action, &self.noise, &mut self.rng);

        report.slipped = motion != DiscreteMotion::from(action);
        self.num_steps += 1;
        report.num_steps = self.num_steps;

        debug!("Step {}: {} -> {:?} ({:?})", self.num_steps, state, action, motion);

        Ok((
            ExecOutput::Execute {
                state,
                action,
                motion,
                cmd: motion.to_twist(),
            },
            report,
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The motion to execute for a policy action. Forward actions are perturbed by the noise model,
/// turns are executed as they are.
pub fn next_motion<R: Rng + ?Sized>(action: DiscreteAction, noise: &ForwardNoise, rng: &mut R) -> DiscreteMotion {
    noise.sample(action, rng)
}

/// Look up the policy's action for a state and apply noise to it.
pub fn next_action<R: Rng + ?Sized>(
    policy: &PolicyTable,
    state: &DiscreteState,
    noise: &ForwardNoise,
    rng: &mut R,
) -> Result<DiscreteMotion, ExecError> {
    policy
        .get(state)
        .map(|a| next_motion(a, noise, rng))
        .ok_or(ExecError::NoPolicyForState(*state))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
