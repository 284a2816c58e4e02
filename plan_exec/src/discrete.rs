//! # Discretisation
//!
//! Mapping of continuous poses onto finite grids of states. The search planner deduplicates
//! poses with a [`SearchKey`] at a configurable resolution, while the MDP planner works on
//! [`DiscreteState`]s with integer positions and one of four headings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{convert::TryFrom, f64::consts::FRAC_PI_2, fmt, str::FromStr};

use comms_if::msg::TwistCmd;
use serde::{Deserialize, Serialize};
use util::maths::round_to_multiple;

use crate::motion::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A state of the discrete domain, formatted as `"x,y,h"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteState {
    /// Position along x in whole meters
    pub x: i32,

    /// Position along y in whole meters
    pub y: i32,

    pub heading: Heading,
}

/// Key of a continuous pose rounded to the search resolution.
///
/// Each field counts multiples of the resolution. The heading is measured in quarter turns, so a
/// resolution of 0.1 splits each quarter turn into ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub x: i64,
    pub y: i64,
    pub heading: i64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// One of the four grid-aligned headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Heading {
    East,
    North,
    West,
    South,
}

/// A symbolic action of the discrete domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscreteAction {
    Forward,
    TurnLeft,
    TurnRight,
}

/// A motion physically executed by the robot. As well as the nominal actions this includes the
/// arcs a noisy forward action can slip into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscreteMotion {
    Forward,
    TurnLeft,
    TurnRight,
    ArcLeft,
    ArcRight,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StateParseError {
    #[error("Expected a state of the form \"x,y,h\", found {0} fields")]
    WrongNumberOfFields(usize),

    #[error("State field {0:?} is not an integer")]
    InvalidField(String),

    #[error("Heading index must be in 0..4, found {0}")]
    InvalidHeading(i64),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Round a pose to the search resolution.
///
/// x and y are rounded to the nearest multiple of `resolution`, as is the heading measured in
/// quarter turns. Headings which differ by a full turn give the same key.
pub fn to_discrete(pose: &Pose, resolution: f64) -> SearchKey {
    let period = ((4.0 / resolution).round() as i64).max(1);
    let quarter_turns = pose.heading_rad / FRAC_PI_2;

    SearchKey {
        x: round_to_multiple(pose.x(), resolution) as i64,
        y: round_to_multiple(pose.y(), resolution) as i64,
        heading: (round_to_multiple(quarter_turns, resolution) as i64).rem_euclid(period),
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DiscreteState {
    pub fn new(x: i32, y: i32, heading: Heading) -> Self {
        Self { x, y, heading }
    }

    /// Round a continuous pose to the nearest discrete state.
    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            x: pose.x().round() as i32,
            y: pose.y().round() as i32,
            heading: Heading::from_angle(pose.heading_rad),
        }
    }

    /// The continuous pose at the centre of this state.
    pub fn to_pose(&self) -> Pose {
        Pose::new(self.x as f64, self.y as f64, self.heading.angle_rad())
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.heading.index())
    }
}

impl FromStr for DiscreteState {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(StateParseError::WrongNumberOfFields(fields.len()));
        }

        let parse = |f: &str| {
            f.parse::<i64>()
                .map_err(|_| StateParseError::InvalidField(f.to_string()))
        };
        let to_i32 = |f: &str| {
            parse(f).and_then(|v| {
                i32::try_from(v).map_err(|_| StateParseError::InvalidField(f.to_string()))
            })
        };

        let heading = parse(fields[2])?;
        if !(0..4).contains(&heading) {
            return Err(StateParseError::InvalidHeading(heading));
        }

        Ok(Self {
            x: to_i32(fields[0])?,
            y: to_i32(fields[1])?,
            heading: Heading::from_index(heading),
        })
    }
}

impl Heading {
    /// All headings in index order.
    pub const ALL: [Heading; 4] = [Heading::East, Heading::North, Heading::West, Heading::South];

    /// Get the heading for a number of quarter turns anticlockwise from east.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    /// Get the nearest heading to the angle.
    pub fn from_angle(angle_rad: f64) -> Self {
        Self::from_index((angle_rad / FRAC_PI_2).round() as i64)
    }

    pub fn index(self) -> u8 {
        match self {
            Heading::East => 0,
            Heading::North => 1,
            Heading::West => 2,
            Heading::South => 3,
        }
    }

    /// Angle to the +ve x axis in radians, in [0, 2pi).
    pub fn angle_rad(self) -> f64 {
        self.index() as f64 * FRAC_PI_2
    }

    /// Rotate by a number of quarter turns, positive anticlockwise.
    pub fn rotated(self, quarter_turns: i32) -> Self {
        Self::from_index(self.index() as i64 + quarter_turns as i64)
    }
}

impl DiscreteAction {
    /// All actions, in the order ties are broken in.
    pub const ALL: [DiscreteAction; 3] = [
        DiscreteAction::Forward,
        DiscreteAction::TurnLeft,
        DiscreteAction::TurnRight,
    ];

    /// The `[v, w]` pair this action is persisted as.
    pub fn pair(self) -> [i32; 2] {
        match self {
            DiscreteAction::Forward => [1, 0],
            DiscreteAction::TurnLeft => [0, 1],
            DiscreteAction::TurnRight => [0, -1],
        }
    }

    /// Get the action from its `[v, w]` pair.
    pub fn from_pair(pair: [i32; 2]) -> Option<Self> {
        match pair {
            [1, 0] => Some(DiscreteAction::Forward),
            [0, 1] => Some(DiscreteAction::TurnLeft),
            [0, -1] => Some(DiscreteAction::TurnRight),
            _ => None,
        }
    }
}

impl DiscreteMotion {
    /// Forward speed commanded for this motion, in meters/second.
    pub fn linear_ms(self) -> f64 {
        match self {
            DiscreteMotion::Forward => 1.0,
            DiscreteMotion::TurnLeft | DiscreteMotion::TurnRight => 0.0,
            DiscreteMotion::ArcLeft | DiscreteMotion::ArcRight => FRAC_PI_2,
        }
    }

    /// Turn rate in units of pi/2 radians/second.
    pub fn turn_idx(self) -> i32 {
        match self {
            DiscreteMotion::Forward => 0,
            DiscreteMotion::TurnLeft | DiscreteMotion::ArcLeft => 1,
            DiscreteMotion::TurnRight | DiscreteMotion::ArcRight => -1,
        }
    }

    /// Turn rate in radians/second.
    pub fn angular_rads(self) -> f64 {
        self.turn_idx() as f64 * FRAC_PI_2
    }

    pub fn to_twist(self) -> TwistCmd {
        TwistCmd::planar(self.linear_ms(), self.angular_rads())
    }
}

impl From<DiscreteAction> for DiscreteMotion {
    fn from(action: DiscreteAction) -> Self {
        match action {
            DiscreteAction::Forward => DiscreteMotion::Forward,
            DiscreteAction::TurnLeft => DiscreteMotion::TurnLeft,
            DiscreteAction::TurnRight => DiscreteMotion::TurnRight,
        }
    }
}

impl SearchKey {
    /// The rounded pose values `(x, y, quarter_turns)` this key stands for.
    pub fn values(&self, resolution: f64) -> (f64, f64, f64) {
        (
            self.x as f64 * resolution,
            self.y as f64 * resolution,
            self.heading as f64 * resolution,
        )
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
