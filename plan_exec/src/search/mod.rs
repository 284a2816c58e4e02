//! # Search Planner
//!
//! Plans a sequence of continuous controls from a start pose to a goal with a best-first (A*)
//! search. Every action drives at a fixed speed with one of a sweep of turn rates for one motion
//! period. Successor poses are simulated with the [`MotionModel`], and poses which round to the
//! same [`SearchKey`](crate::discrete::SearchKey) are deduplicated.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod node;
mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::{Heuristic, SearchParams};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::{BinaryHeap, HashMap};

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::{
    discrete::{to_discrete, SearchKey},
    motion::{CollisionChecker, Control, MotionModel, Pose, Prediction},
    request::{Goal, PlanRequest},
};
use node::{QueueEntry, SearchNode};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of expansions between progress messages.
const PROGRESS_INTERVAL: usize = 10_000;

/// Turn rates closer to zero than this are treated as straight motion.
const STRAIGHT_EPSILON_RADS: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SearchPlanner {
    params: SearchParams,

    motion: MotionModel,

    /// The controls tried from every expanded node
    actions: Vec<Control>,
}

/// The result of a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,

    /// Controls to execute in order, empty unless the goal was reached.
    pub actions: Vec<Control>,

    /// Pose reached by executing the actions, if the goal was reached.
    pub final_pose: Option<Pose>,

    /// Total cost of the actions, if the goal was reached.
    pub path_cost: Option<f64>,

    /// Number of nodes expanded.
    pub num_expanded: usize,

    /// Number of nodes pushed into the frontier, including the start.
    pub num_generated: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchOutcome {
    GoalReached,

    /// Every reachable state was expanded without reaching the goal.
    FrontierExhausted,

    /// The expansion limit was hit before the goal was reached.
    ExpansionLimit,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search key resolution must be positive and finite, found {0}")]
    InvalidKeyResolution(f64),

    #[error("Invalid turn rate sweep: {0} to {1} in steps of {2} rad/s")]
    InvalidSweep(f64, f64, f64),

    #[error("Action cost must be non-negative and finite, found {0}")]
    InvalidActionCost(f64),

    #[error("Goal tolerance must be positive, found {0}")]
    InvalidGoalTolerance(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SearchPlanner {
    pub fn new(params: SearchParams, motion: MotionModel) -> Result<Self, SearchError> {
        if !(params.key_resolution.is_finite() && params.key_resolution > 0.0) {
            return Err(SearchError::InvalidKeyResolution(params.key_resolution));
        }
        if !(params.action_cost.is_finite() && params.action_cost >= 0.0) {
            return Err(SearchError::InvalidActionCost(params.action_cost));
        }
        if !(params.goal_tolerance_m > 0.0) {
            return Err(SearchError::InvalidGoalTolerance(params.goal_tolerance_m));
        }

        let actions = action_sweep(&params)?;

        Ok(Self {
            params,
            motion,
            actions,
        })
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// The controls tried from every expanded node.
    pub fn action_set(&self) -> &[Control] {
        &self.actions
    }

    /// Plan for the given request.
    pub fn plan_request(&self, request: &PlanRequest) -> SearchReport {
        self.plan(request.map, &request.start, &request.goal)
    }

    /// Plan a sequence of controls which takes the robot from the start pose to within tolerance
    /// of the goal.
    ///
    /// If the goal can't be reached the report's actions are empty and its outcome says why.
    pub fn plan<C>(&self, checker: &C, start: &Pose, goal: &Goal) -> SearchReport
    where
        C: CollisionChecker + ?Sized,
    {
        let resolution = self.params.key_resolution;

        // Node arena, the start node is always index 0
        let mut nodes = vec![SearchNode {
            pose: *start,
            g: 0.0,
            control: None,
            parent: None,
        }];

        // Frontier of nodes to expand
        let mut heap = BinaryHeap::new();

        // Best priority pushed for each visited key
        let mut best: HashMap<SearchKey, f64> = HashMap::new();

        let start_f = self.heuristic(start, goal);
        heap.push(QueueEntry::new(start_f, 0.0, 0));
        best.insert(to_discrete(start, resolution), start_f);

        let mut num_expanded = 0;

        info!(
            "Searching from ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}) with {} actions",
            start.x(),
            start.y(),
            start.heading_rad,
            goal.position_m.x,
            goal.position_m.y,
            self.actions.len()
        );

        while let Some(entry) = heap.pop() {
            let pose = nodes[entry.node].pose;

            if goal.is_reached(pose.x(), pose.y(), self.params.goal_tolerance_m) {
                let actions = reconstruct(&nodes, entry.node);

                info!(
                    "Goal reached with {} actions (cost {:.2}) after {} expansions",
                    actions.len(),
                    entry.g.0,
                    num_expanded
                );

                return SearchReport {
                    outcome: SearchOutcome::GoalReached,
                    actions,
                    final_pose: Some(pose),
                    path_cost: Some(entry.g.0),
                    num_expanded,
                    num_generated: nodes.len(),
                };
            }

            // Skip entries superseded by a better push to the same key
            if let Some(&f) = best.get(&to_discrete(&pose, resolution)) {
                if f < entry.f.0 {
                    continue;
                }
            }

            if num_expanded >= self.params.max_expansions {
                warn!(
                    "Search hit the limit of {} expansions without reaching the goal",
                    self.params.max_expansions
                );
                return self.failed(SearchOutcome::ExpansionLimit, num_expanded, nodes.len());
            }

            num_expanded += 1;
            if num_expanded % PROGRESS_INTERVAL == 0 {
                debug!(
                    "{} expansions, {} in frontier, best f = {:.3}",
                    num_expanded,
                    heap.len(),
                    entry.f.0
                );
            }

            for control in self.actions.iter() {
                let next = match self.motion.predict(checker, &pose, control) {
                    Prediction::Free(p) => p,
                    Prediction::Collision => continue,
                };

                let g = entry.g.0 + self.params.action_cost;
                let f = g + self.heuristic(&next, goal);
                let key = to_discrete(&next, resolution);

                if best.get(&key).map_or(true, |&b| f < b) {
                    trace!(
                        "Push ({:.3}, {:.3}, {:.3}) with f = {:.3}",
                        next.x(),
                        next.y(),
                        next.heading_rad,
                        f
                    );

                    best.insert(key, f);
                    nodes.push(SearchNode {
                        pose: next,
                        g,
                        control: Some(*control),
                        parent: Some(entry.node),
                    });
                    heap.push(QueueEntry::new(f, g, nodes.len() - 1));
                }
            }
        }

        warn!(
            "Search frontier exhausted after {} expansions without reaching the goal",
            num_expanded
        );

        self.failed(SearchOutcome::FrontierExhausted, num_expanded, nodes.len())
    }

    /// Estimate of the cost from the pose to the goal.
    fn heuristic(&self, pose: &Pose, goal: &Goal) -> f64 {
        let dist_m = goal.distance_m(pose.x(), pose.y());

        match self.params.heuristic {
            Heuristic::Euclidean => dist_m,
            Heuristic::StepNormalised => {
                let step_m = (self.params.linear_speed_ms * self.motion.params().dt_s).abs();
                if step_m > 0.0 {
                    self.params.action_cost * (dist_m - self.params.goal_tolerance_m).max(0.0)
                        / step_m
                } else {
                    0.0
                }
            }
        }
    }

    fn failed(&self, outcome: SearchOutcome, num_expanded: usize, num_generated: usize) -> SearchReport {
        SearchReport {
            outcome,
            actions: Vec::new(),
            final_pose: None,
            path_cost: None,
            num_expanded,
            num_generated,
        }
    }
}

impl SearchReport {
    pub fn is_success(&self) -> bool {
        self.outcome == SearchOutcome::GoalReached
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the controls for the turn rate sweep, which includes both ends.
fn action_sweep(params: &SearchParams) -> Result<Vec<Control>, SearchError> {
    let (min, max, step) = (
        params.angular_min_rads,
        params.angular_max_rads,
        params.angular_step_rads,
    );

    if !(min.is_finite() && max.is_finite() && step.is_finite() && step > 0.0 && max >= min)
        || !params.linear_speed_ms.is_finite()
    {
        return Err(SearchError::InvalidSweep(min, max, step));
    }

    // Small tolerance so a max which is a whole number of steps from min is included
    let num_steps = ((max - min) / step + 1e-9).floor() as usize;

    Ok((0..=num_steps)
        .map(|i| {
            let w = min + step * i as f64;
            let w = if w.abs() < STRAIGHT_EPSILON_RADS { 0.0 } else { w };
            Control::new(params.linear_speed_ms, w)
        })
        .collect())
}

/// Walk the parent chain back from the node, returning the controls from the start in order.
fn reconstruct(nodes: &[SearchNode], mut index: usize) -> Vec<Control> {
    let mut actions = Vec::new();

    while let (Some(parent), Some(control)) = (nodes[index].parent, nodes[index].control) {
        actions.push(control);
        index = parent;
    }

    actions.reverse();
    actions
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{inflate, InflatedGrid, MapParams, OccupancyGrid};
    use crate::motion::MotionParams;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn free_map() -> InflatedGrid {
        inflate(
            &OccupancyGrid::new_free(200, 200, 0.05).unwrap(),
            &MapParams::default(),
        )
        .unwrap()
    }

    fn planner(params: SearchParams) -> SearchPlanner {
        SearchPlanner::new(params, MotionModel::new(MotionParams::default()).unwrap()).unwrap()
    }

    /// Replay the plan and check it ends within tolerance of the goal.
    fn check_plan(planner: &SearchPlanner, map: &InflatedGrid, start: &Pose, goal: &Goal, report: &SearchReport) {
        assert_eq!(report.outcome, SearchOutcome::GoalReached);
        assert!(!report.actions.is_empty());

        let end = planner
            .motion
            .rollout(map, start, &report.actions)
            .free()
            .expect("Plan collides when replayed");

        assert_eq!(Some(end), report.final_pose);
        assert!(goal.distance_m(end.x(), end.y()) < 0.25);
        assert_eq!(report.path_cost, Some(report.actions.len() as f64));
    }

    #[test]
    fn test_action_sweep() {
        let p = planner(SearchParams::default());
        let w: Vec<f64> = p.action_set().iter().map(|c| c.angular_rads).collect();

        assert_eq!(w, vec![-PI, -FRAC_PI_2, 0.0, FRAC_PI_2, PI]);
        assert!(p.action_set().iter().all(|c| c.linear_ms == 1.0));

        // Rounded bounds still give five rates with an exact zero
        let params = SearchParams {
            angular_min_rads: -3.14,
            angular_max_rads: 3.14001,
            angular_step_rads: 1.57,
            ..SearchParams::default()
        };
        let p = planner(params);
        assert_eq!(p.action_set().len(), 5);
        assert_eq!(p.action_set()[2].angular_rads, 0.0);
    }

    #[test]
    fn test_invalid_params() {
        let motion = MotionModel::new(MotionParams::default()).unwrap();
        let params = SearchParams {
            key_resolution: 0.0,
            ..SearchParams::default()
        };
        assert!(matches!(
            SearchPlanner::new(params, motion.clone()),
            Err(SearchError::InvalidKeyResolution(_))
        ));

        let params = SearchParams {
            angular_step_rads: 0.0,
            ..SearchParams::default()
        };
        assert!(matches!(
            SearchPlanner::new(params, motion),
            Err(SearchError::InvalidSweep(_, _, _))
        ));
    }

    #[test]
    fn test_free_map_scenario() {
        let map = free_map();
        let p = planner(SearchParams::default());
        let start = Pose::new(1.0, 1.0, 0.0);
        let goal = Goal::new(1.0, 8.0);

        let report = p.plan_request(&PlanRequest::new(&map, start, goal));
        check_plan(&p, &map, &start, &goal, &report);

        // Planning is deterministic
        let again = p.plan(&map, &start, &goal);
        assert_eq!(again.actions, report.actions);
        assert_eq!(again.num_expanded, report.num_expanded);
    }

    #[test]
    fn test_step_normalised_heuristic() {
        let map = free_map();
        let start = Pose::new(1.0, 1.0, 0.0);
        let goal = Goal::new(1.0, 8.0);

        let euclid = planner(SearchParams::default()).plan(&map, &start, &goal);

        let p = planner(SearchParams {
            heuristic: Heuristic::StepNormalised,
            ..SearchParams::default()
        });
        let report = p.plan(&map, &start, &goal);
        check_plan(&p, &map, &start, &goal, &report);

        // The better informed heuristic expands fewer nodes for a plan of no greater cost
        assert!(report.num_expanded < euclid.num_expanded);
        assert!(report.actions.len() <= euclid.actions.len());
    }

    #[test]
    fn test_avoids_obstacles() {
        // Wall across most of the map between the start and the goal
        let mut raw = OccupancyGrid::new_free(200, 200, 0.05).unwrap();
        raw.add_obstacle((80, 100), (0, 150));
        let map = inflate(&raw, &MapParams::default()).unwrap();

        let p = planner(SearchParams {
            heuristic: Heuristic::StepNormalised,
            ..SearchParams::default()
        });
        let start = Pose::new(1.0, 1.0, 0.0);
        let goal = Goal::new(1.0, 8.0);

        let report = p.plan(&map, &start, &goal);
        check_plan(&p, &map, &start, &goal, &report);

        // Going round the wall takes far more than the direct route
        assert!(report.actions.len() > 20);
    }

    #[test]
    fn test_start_in_collision() {
        let map = free_map();
        let p = planner(SearchParams::default());

        let report = p.plan(&map, &Pose::new(0.0, 0.0, 0.0), &Goal::new(1.0, 8.0));

        assert_eq!(report.outcome, SearchOutcome::FrontierExhausted);
        assert!(report.actions.is_empty());
        assert!(!report.is_success());
        assert_eq!(report.num_expanded, 1);
        assert_eq!(report.num_generated, 1);
    }

    #[test]
    fn test_expansion_limit() {
        let map = free_map();
        let p = planner(SearchParams {
            max_expansions: 10,
            ..SearchParams::default()
        });

        let report = p.plan(&map, &Pose::new(1.0, 1.0, 0.0), &Goal::new(1.0, 8.0));

        assert_eq!(report.outcome, SearchOutcome::ExpansionLimit);
        assert!(report.actions.is_empty());
        assert_eq!(report.num_expanded, 10);
    }

    #[test]
    fn test_start_at_goal() {
        let map = free_map();
        let p = planner(SearchParams::default());

        let report = p.plan(&map, &Pose::new(2.0, 2.0, 0.0), &Goal::new(2.1, 2.0));

        assert!(report.is_success());
        assert!(report.actions.is_empty());
        assert_eq!(report.num_expanded, 0);
    }
}
