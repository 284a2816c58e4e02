//! # Value Iteration
//!
//! The MDP model over the discrete state space and synchronous (Jacobi) Bellman sweeps over it.
//! All transitions are simulated once when the model is built, so a sweep is just arithmetic on
//! the transition table.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Serialize;

use super::MdpParams;
use crate::{
    discrete::{DiscreteAction, DiscreteState, Heading},
    map::InflatedGrid,
    motion::{CollisionChecker, MotionModel, Prediction},
    noise::ForwardNoise,
    request::Goal,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of sweeps between progress messages.
const PROGRESS_INTERVAL: usize = 25;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Every integer position on a map, with each of the four headings.
///
/// x runs over `0..=floor(map_width_m)` and y over `0..=floor(map_height_m)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace {
    nx: usize,
    ny: usize,
}

/// The value of every state in a state space.
#[derive(Debug, Clone)]
pub struct StateValueTable {
    space: StateSpace,
    values: Vec<f64>,
}

/// Summary of a value iteration run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepReport {
    /// Number of sweeps performed
    pub num_sweeps: usize,

    /// Largest change in any state's value during the last sweep
    pub final_delta: f64,

    /// True if the sweeps stopped because the values converged rather than at the sweep limit
    pub converged: bool,
}

/// The rewards and transitions of the MDP for one map and goal.
#[derive(Debug, Clone)]
pub struct MdpModel {
    space: StateSpace,

    /// Immediate reward of each state
    rewards: Vec<f64>,

    /// Outcomes of each action from each state, indexed by state then by position in
    /// [`DiscreteAction::ALL`]
    transitions: Vec<[Vec<Outcome>; 3]>,

    crash_penalty: f64,

    discount: f64,
}

/// One possible result of an action.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Outcome {
    prob: f64,

    /// Index of the next state, `None` if the motion crashes
    next: Option<usize>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StateSpace {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    /// The state space covering the map.
    pub fn for_map(map: &InflatedGrid) -> Self {
        // Small tolerance so maps which are a whole number of meters include their far edge
        let n = |len_m: f64| (len_m + 1e-9).floor().max(0.0) as usize + 1;
        Self::new(n(map.world_width_m()), n(map.world_height_m()))
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny * 4
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the state, or `None` if it's outside the space.
    pub fn index(&self, state: &DiscreteState) -> Option<usize> {
        if state.x < 0 || state.y < 0 {
            return None;
        }
        let (x, y) = (state.x as usize, state.y as usize);
        if x >= self.nx || y >= self.ny {
            return None;
        }
        Some((y * self.nx + x) * 4 + state.heading.index() as usize)
    }

    /// The state at the index.
    pub fn state(&self, index: usize) -> DiscreteState {
        let cell = index / 4;
        DiscreteState::new(
            (cell % self.nx) as i32,
            (cell / self.nx) as i32,
            Heading::from_index((index % 4) as i64),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = DiscreteState> + '_ {
        (0..self.len()).map(move |i| self.state(i))
    }
}

impl StateValueTable {
    pub fn get(&self, state: &DiscreteState) -> Option<f64> {
        self.space.index(state).map(|i| self.values[i])
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl MdpModel {
    /// Build the model for the goal, simulating every action from every state.
    pub fn build(
        map: &InflatedGrid,
        motion: &MotionModel,
        noise: &ForwardNoise,
        params: &MdpParams,
        goal: &Goal,
    ) -> Self {
        let space = StateSpace::for_map(map);
        let normalisation =
            params.distance_penalty_scale * (map.world_width_m() + map.world_height_m());

        let rewards = space
            .iter()
            .map(|s| {
                let (x, y) = (s.x as f64, s.y as f64);
                if map.collides(x, y) {
                    params.crash_penalty
                } else if goal.is_reached(x, y, params.goal_tolerance_m) {
                    params.goal_reward
                } else {
                    -goal.distance_m(x, y) / normalisation
                }
            })
            .collect();

        let outcomes = |state: &DiscreteState, action: DiscreteAction| -> Vec<Outcome> {
            noise
                .outcomes(action)
                .into_iter()
                .map(|(prob, m)| Outcome {
                    prob,
                    next: match motion.discrete_motion(map, state, m) {
                        Prediction::Free(next) => space.index(&next),
                        Prediction::Collision => None,
                    },
                })
                .collect()
        };

        let transitions = space
            .iter()
            .map(|s| {
                [
                    outcomes(&s, DiscreteAction::ALL[0]),
                    outcomes(&s, DiscreteAction::ALL[1]),
                    outcomes(&s, DiscreteAction::ALL[2]),
                ]
            })
            .collect();

        debug!(
            "Built MDP model with {} states ({} x {} positions)",
            space.len(),
            space.nx,
            space.ny
        );

        Self {
            space,
            rewards,
            transitions,
            crash_penalty: params.crash_penalty,
            discount: params.discount,
        }
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    /// Immediate reward of the state at the index.
    pub fn reward(&self, index: usize) -> f64 {
        self.rewards[index]
    }

    /// Expected value of the state reached by taking the action, crashes are worth the crash
    /// penalty.
    pub fn expected_next_value(&self, index: usize, action: DiscreteAction, values: &[f64]) -> f64 {
        self.transitions[index][action_index(action)]
            .iter()
            .map(|o| o.prob * o.next.map_or(self.crash_penalty, |j| values[j]))
            .sum()
    }

    /// Reward of the state plus the discounted expected value of taking the action.
    pub fn q_value(&self, index: usize, action: DiscreteAction, values: &[f64]) -> f64 {
        self.rewards[index] + self.discount * self.expected_next_value(index, action, values)
    }

    /// The action with the highest Q value and that value. Ties go to the earliest action in
    /// [`DiscreteAction::ALL`].
    pub fn best_action(&self, index: usize, values: &[f64]) -> (DiscreteAction, f64) {
        let mut best = (DiscreteAction::ALL[0], self.q_value(index, DiscreteAction::ALL[0], values));

        for &action in DiscreteAction::ALL[1..].iter() {
            let q = self.q_value(index, action, values);
            if q > best.1 {
                best = (action, q);
            }
        }

        best
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run Bellman sweeps until the largest change in value drops below `convergence_tol` or
/// `max_sweeps` sweeps have run. Every state is updated from the previous sweep's values.
pub fn value_iteration(
    model: &MdpModel,
    max_sweeps: usize,
    convergence_tol: f64,
) -> (StateValueTable, SweepReport) {
    let n = model.space.len();
    let mut values = vec![0.0; n];
    let mut next = vec![0.0; n];

    let mut report = SweepReport {
        num_sweeps: 0,
        final_delta: std::f64::INFINITY,
        converged: false,
    };

    for sweep in 1..=max_sweeps {
        let mut delta: f64 = 0.0;

        for (i, v) in next.iter_mut().enumerate() {
            *v = model.best_action(i, &values).1;
            delta = delta.max((*v - values[i]).abs());
        }

        std::mem::swap(&mut values, &mut next);
        report.num_sweeps = sweep;
        report.final_delta = delta;

        trace!("Sweep {}: delta = {:e}", sweep, delta);
        if sweep % PROGRESS_INTERVAL == 0 {
            debug!("Sweep {} of at most {}: delta = {:e}", sweep, max_sweeps, delta);
        }

        if delta < convergence_tol {
            report.converged = true;
            break;
        }
    }

    (
        StateValueTable {
            space: model.space,
            values,
        },
        report,
    )
}

fn action_index(action: DiscreteAction) -> usize {
    match action {
        DiscreteAction::Forward => 0,
        DiscreteAction::TurnLeft => 1,
        DiscreteAction::TurnRight => 2,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{inflate, MapParams, OccupancyGrid};
    use crate::motion::MotionParams;

    fn model() -> MdpModel {
        let map = inflate(
            &OccupancyGrid::new_free(200, 200, 0.05).unwrap(),
            &MapParams::default(),
        )
        .unwrap();
        MdpModel::build(
            &map,
            &MotionModel::new(MotionParams::default()).unwrap(),
            &ForwardNoise::default(),
            &MdpParams::default(),
            &Goal::new(1.0, 8.0),
        )
    }

    #[test]
    fn test_state_space() {
        let space = StateSpace::new(11, 11);
        assert_eq!(space.len(), 484);

        for (i, s) in space.iter().enumerate() {
            assert_eq!(space.index(&s), Some(i));
        }

        assert_eq!(space.index(&DiscreteState::new(11, 0, Heading::East)), None);
        assert_eq!(space.index(&DiscreteState::new(0, -1, Heading::East)), None);

        let map = inflate(
            &OccupancyGrid::new_free(2500, 983, 0.02).unwrap(),
            &MapParams::default(),
        )
        .unwrap();
        assert_eq!(StateSpace::for_map(&map), StateSpace::new(51, 20));
    }

    #[test]
    fn test_rewards() {
        let m = model();
        let idx = |x, y, h| m.space().index(&DiscreteState::new(x, y, h)).unwrap();

        assert_eq!(m.reward(idx(0, 0, Heading::East)), -20.0);
        assert_eq!(m.reward(idx(10, 5, Heading::North)), -20.0);
        assert_eq!(m.reward(idx(1, 8, Heading::West)), 20.0);

        let r = m.reward(idx(4, 4, Heading::East));
        assert!((r + 5.0 / 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_transitions() {
        let m = model();
        let idx = |x, y, h| m.space().index(&DiscreteState::new(x, y, h)).unwrap();
        let from = idx(1, 7, Heading::North);

        let fwd = &m.transitions[from][0];
        assert_eq!(fwd[0].next, Some(idx(1, 8, Heading::North)));
        assert_eq!(fwd[1].next, None);
        assert_eq!(fwd[2].next, Some(idx(2, 8, Heading::East)));

        assert_eq!(m.transitions[from][1][0].next, Some(idx(1, 7, Heading::West)));
        assert_eq!(m.transitions[from][2][0].next, Some(idx(1, 7, Heading::East)));

        // Crashes are worth the crash penalty
        let values = vec![1.0; m.space().len()];
        let expected = 0.9 * 1.0 + 0.05 * -20.0 + 0.05 * 1.0;
        assert!((m.expected_next_value(from, DiscreteAction::Forward, &values) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_convergence() {
        let m = model();

        let (_, report) = value_iteration(&m, 200, 1e-6);
        assert_eq!(report.num_sweeps, 200);
        assert!(!report.converged);

        let (values, report) = value_iteration(&m, 200, 1e-2);
        assert!(report.converged);
        assert!(report.num_sweeps < 200);
        assert!(report.final_delta < 1e-2);

        // The goal is worth about goal_reward / (1 - discount)
        let goal_value = values.get(&DiscreteState::new(1, 8, Heading::North)).unwrap();
        assert!((goal_value - 400.0).abs() < 1.0);

        let (_, report) = value_iteration(&m, 0, 1e-2);
        assert_eq!(report.num_sweeps, 0);
        assert!(!report.converged);
    }
}
