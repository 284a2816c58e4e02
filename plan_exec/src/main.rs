//! Grid planner executable entry point.
//!
//! # Architecture
//!
//! A single planning run consists of:
//!
//!     - Parse and validate the goal and start
//!     - Load the parameters and the occupancy grid (or a free map)
//!     - Inflate the grid, reusing a cached inflation where one can be trusted
//!     - Plan with either the search or the MDP planner
//!     - Save the controls or policy into the session's `controls` directory
//!     - Optionally rehearse the result on a simulated base

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use std::{path::PathBuf, str::FromStr, time::Duration};
use structopt::StructOpt;

// Internal
use plan_lib::{
    exec::{dispatch_controls, run_policy, sim::SimBase, InitData, PolicyExec},
    map::{inflate, InflationCache, OccupancyGrid},
    mdp::MdpPlanner,
    motion::{MotionModel, Pose},
    params::PlannerParams,
    request::{Goal, PlanRequest},
    search::SearchPlanner,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Plan a path or policy for a wheeled base on an occupancy grid.
#[derive(Debug, StructOpt)]
#[structopt(name = "plan_exec")]
struct Opt {
    /// Goal position in meters, as "x,y".
    #[structopt(long, allow_hyphen_values = true)]
    goal: Goal,

    /// Planner to use, either "search" or "mdp".
    #[structopt(long, default_value = "search")]
    mode: Mode,

    /// Path to a JSON occupancy grid message. If not given a free map shaped by the `free_map`
    /// parameters is used.
    #[structopt(long, parse(from_os_str))]
    map: Option<PathBuf>,

    /// Start pose as "x,y,theta", in meters and radians.
    #[structopt(long, default_value = "1,1,0", parse(try_from_str = parse_start), allow_hyphen_values = true)]
    start: Pose,

    /// Parameter file, relative to the params directory.
    #[structopt(long, default_value = "planner.toml")]
    params: String,

    /// Label for the saved controls, usually the map's name.
    #[structopt(long, default_value = "map1")]
    name: String,

    /// Rehearse the plan on a simulated base after planning.
    #[structopt(long)]
    simulate: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Search,
    Mdp,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(Mode::Search),
            "mdp" => Ok(Mode::Mdp),
            _ => Err(format!("Unknown mode {:?}, expected \"search\" or \"mdp\"", s)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // Malformed goals and starts are rejected here, before any other work
    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("plan_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Grid Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    let result = run(&opt, &session);

    if let Err(ref e) = result {
        warn!("Planning failed: {}", e);
    }

    session.exit();

    result
}

fn run(opt: &Opt, session: &Session) -> Result<(), Report> {
    // ---- LOAD PARAMETERS ----

    let params: PlannerParams =
        util::params::load(&opt.params).wrap_err("Could not load planner params")?;

    info!("Parameters loaded from {:?}", opt.params);
    info!(
        "Goal: ({}, {}), start: ({:.2}, {:.2}, {:.2})",
        opt.goal.position_m.x,
        opt.goal.position_m.y,
        opt.start.x(),
        opt.start.y(),
        opt.start.heading_rad
    );

    // ---- LOAD AND INFLATE MAP ----

    let raw = match opt.map {
        Some(ref path) => {
            info!("Loading map from {:?}", path);
            let msg = comms_if::msg::load_json(path).wrap_err("Could not load the map")?;
            OccupancyGrid::from_msg(&msg).wrap_err("Invalid map")?
        }
        None => {
            let shape = &params.map.free_map;
            info!(
                "No map given, using a free {}x{} map at {} m/cell",
                shape.width_cells, shape.height_cells, shape.resolution_m
            );
            OccupancyGrid::new_free(shape.width_cells, shape.height_cells, shape.resolution_m)
                .wrap_err("Invalid free map shape")?
        }
    };

    let map = match params.map.cache_dir {
        Some(ref dir) => {
            let root = host::get_sw_root().wrap_err("Software root is not set")?;
            InflationCache::new(root.join(dir)).load_or_inflate(&raw, &params.map)
        }
        None => inflate(&raw, &params.map),
    }
    .wrap_err("Could not inflate the map")?;

    info!(
        "Map inflated by {} cells, {} of {} cells occupied\n",
        map.pixel_buffer(),
        map.num_occupied(),
        map.width() * map.height()
    );

    // ---- PLAN ----

    let motion = MotionModel::new(params.motion.clone()).wrap_err("Invalid motion parameters")?;
    let request = PlanRequest::new(&map, opt.start, opt.goal);

    match opt.mode {
        Mode::Search => run_search(opt, session, &params, motion, &request),
        Mode::Mdp => run_mdp(opt, session, &params, motion, &request),
    }
}

fn run_search(
    opt: &Opt,
    session: &Session,
    params: &PlannerParams,
    motion: MotionModel,
    request: &PlanRequest,
) -> Result<(), Report> {
    let planner = SearchPlanner::new(params.search.clone(), motion.clone())
        .wrap_err("Invalid search parameters")?;

    let report = planner.plan_request(request);
    session.save("search_report.json", report.clone());

    if !report.is_success() {
        return Err(eyre!(
            "No path found to the goal ({:?} after {} expansions)",
            report.outcome,
            report.num_expanded
        ));
    }

    let controls: Vec<[f64; 2]> = report
        .actions
        .iter()
        .map(|c| [c.linear_ms, c.angular_rads])
        .collect();
    session.save(controls_path("CSDA", opt), controls);

    info!("Search found {} controls", report.actions.len());

    if opt.simulate {
        let mut base = SimBase::new(request.map, motion, request.start, false);
        let num_cmds = dispatch_controls(
            &mut base,
            &report.actions,
            Duration::from_secs_f64(params.exec.dwell_s.max(0.0)),
        )
        .wrap_err("Simulated execution failed")?;

        let end = base.pose();
        info!(
            "Simulated {} controls, ended at ({:.2}, {:.2}), {:.3} m from the goal",
            num_cmds,
            end.x(),
            end.y(),
            request.goal.distance_m(end.x(), end.y())
        );
    }

    Ok(())
}

fn run_mdp(
    opt: &Opt,
    session: &Session,
    params: &PlannerParams,
    motion: MotionModel,
    request: &PlanRequest,
) -> Result<(), Report> {
    let planner = MdpPlanner::new(params.mdp.clone(), motion.clone(), params.noise.clone())
        .wrap_err("Invalid MDP parameters")?;

    let report = planner.plan_request(request);
    session.save("mdp_sweeps.json", report.sweeps);
    session.save(controls_path("DSPA", opt), report.policy.clone());

    info!("Policy planned over {} states", report.policy.len());

    if opt.simulate {
        let mut exec = PolicyExec::new(
            params.exec.clone(),
            params.noise.clone(),
            params.mdp.goal_tolerance_m,
        )
        .wrap_err("Could not create the policy executor")?;
        exec.init(InitData {
            policy: report.policy,
            goal: request.goal,
        })
        .wrap_err("Could not initialise the policy executor")?;

        let mut base = SimBase::new(request.map, motion, request.start, false);
        let run = run_policy(&mut exec, &mut base).wrap_err("Simulated execution failed")?;
        session.save("policy_run.json", run);

        if run.goal_reached {
            info!("Simulated base reached the goal in {} steps", run.num_steps);
        } else {
            warn!("Simulated base did not reach the goal in {} steps", run.num_steps);
        }
    }

    Ok(())
}

/// Session-relative path of saved controls, `controls/<prefix>_<name>_<gx>_<gy>.json`.
fn controls_path(prefix: &str, opt: &Opt) -> PathBuf {
    PathBuf::from("controls").join(format!(
        "{}_{}_{}_{}.json",
        prefix, opt.name, opt.goal.position_m.x, opt.goal.position_m.y
    ))
}

/// Parse a start pose of the form "x,y,theta".
fn parse_start(s: &str) -> Result<Pose, String> {
    let values = s
        .split(',')
        .map(|f| f.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| format!("Start {:?} is not numeric: {}", s, e))?;

    match values.as_slice() {
        [x, y, theta] if values.iter().all(|v| v.is_finite()) => Ok(Pose::new(*x, *y, *theta)),
        _ => Err(format!("Please enter a start in the format \"x,y,theta\", found {:?}", s)),
    }
}
