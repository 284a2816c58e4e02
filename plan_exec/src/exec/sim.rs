//! # Simulated Base
//!
//! A base which integrates received commands with the motion model over an inflated map. It
//! provides both ends of execution, poses and command sink, so plans can be rehearsed without a
//! robot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{convert::Infallible, time::Duration};

use comms_if::msg::TwistCmd;
use log::warn;

use super::{ControlSink, PoseSource};
use crate::{
    map::InflatedGrid,
    motion::{Control, MotionModel, Pose, Prediction},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SimBase<'a> {
    map: &'a InflatedGrid,

    motion: MotionModel,

    pose: Pose,

    /// If true sends and settles block for their real duration
    realtime: bool,

    num_cmds: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Simulated base collided while moving from ({:.2}, {:.2})", .0.x(), .0.y())]
    Collision(Pose),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> SimBase<'a> {
    pub fn new(map: &'a InflatedGrid, motion: MotionModel, start: Pose, realtime: bool) -> Self {
        Self {
            map,
            motion,
            pose: start,
            realtime,
            num_cmds: 0,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Number of commands received
    pub fn num_cmds(&self) -> usize {
        self.num_cmds
    }
}

impl<'a> ControlSink for SimBase<'a> {
    type Error = SimError;

    /// Each command moves the base for one motion period. The pose is left where it was if the
    /// motion collides.
    fn send(&mut self, cmd: &TwistCmd, hold: Duration) -> Result<(), Self::Error> {
        self.num_cmds += 1;

        let control = Control::new(cmd.linear_x_ms(), cmd.angular_z_rads());
        match self.motion.predict(self.map, &self.pose, &control) {
            Prediction::Free(p) => self.pose = p,
            Prediction::Collision => {
                warn!("Simulated base collided executing {:?}", control);
                return Err(SimError::Collision(self.pose));
            }
        }

        if self.realtime {
            std::thread::sleep(hold);
        }

        Ok(())
    }

    fn settle(&mut self, wait: Duration) -> Result<(), Self::Error> {
        if self.realtime {
            std::thread::sleep(wait);
        }
        Ok(())
    }
}

impl<'a> PoseSource for SimBase<'a> {
    type Error = Infallible;

    fn current_pose(&mut self) -> Result<Pose, Self::Error> {
        Ok(self.pose)
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

    #[test]
    fn test_sim_base() {
        let map = inflate(
            &OccupancyGrid::new_free(200, 200, 0.05).unwrap(),
            &MapParams::default(),
        )
        .unwrap();
        let motion = MotionModel::new(MotionParams::default()).unwrap();
        let mut base = SimBase::new(&map, motion, Pose::new(5.0, 5.0, 0.0), false);

        base.send(&TwistCmd::planar(1.0, 0.0), Duration::from_secs(0)).unwrap();
        base.send(&TwistCmd::planar(1.0, 0.0), Duration::from_secs(0)).unwrap();
        let pose = base.current_pose().unwrap();
        assert!((pose.x() - 6.0).abs() < 1e-9);
        assert!((pose.y() - 5.0).abs() < 1e-9);

        // Drive into the wall
        let mut result = Ok(());
        for _ in 0..20 {
            result = base.send(&TwistCmd::planar(1.0, 0.0), Duration::from_secs(0));
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(SimError::Collision(_))));
        assert!(base.pose().x() < 9.45);
        assert_eq!(base.num_cmds(), 2 + 7);
    }
}
