//! # Command Dispatch
//!
//! Turns planned actions into paced velocity commands for the base.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use comms_if::msg::TwistCmd;
use log::trace;

use crate::{discrete::DiscreteMotion, motion::Control};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which accepts velocity commands, such as the base's command topic or a simulator.
pub trait ControlSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send the command, returning once it has been held for `hold`.
    fn send(&mut self, cmd: &TwistCmd, hold: Duration) -> Result<(), Self::Error>;

    /// Wait for the base to settle after a motion.
    fn settle(&mut self, wait: Duration) -> Result<(), Self::Error> {
        std::thread::sleep(wait);
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Send each continuous control once, returning the number of commands sent.
pub fn dispatch_controls<S>(sink: &mut S, controls: &[Control], dwell: Duration) -> Result<usize, S::Error>
where
    S: ControlSink + ?Sized,
{
    for (i, control) in controls.iter().enumerate() {
        trace!(
            "Control {}: v = {:.3} m/s, w = {:.3} rad/s",
            i,
            control.linear_ms,
            control.angular_rads
        );
        sink.send(&control.to_twist(), dwell)?;
    }

    Ok(controls.len())
}

/// Send each discrete motion's command `repeats` times, returning the number of commands sent.
pub fn dispatch_discrete<S>(
    sink: &mut S,
    motions: &[DiscreteMotion],
    dwell: Duration,
    repeats: usize,
) -> Result<usize, S::Error>
where
    S: ControlSink + ?Sized,
{
    let mut sent = 0;

    for motion in motions {
        let cmd = motion.to_twist();
        trace!("Motion {:?} sent {} times", motion, repeats);

        for _ in 0..repeats {
            sink.send(&cmd, dwell)?;
            sent += 1;
        }
    }

    Ok(sent)
}

/// Convert a duration in seconds into a [`Duration`], treating negative or non-finite values as
/// zero.
pub(crate) fn seconds(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::from_secs(0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    /// Records everything sent to it.
    #[derive(Default)]
    struct Recorder {
        sent: Vec<(TwistCmd, Duration)>,
    }

    impl ControlSink for Recorder {
        type Error = std::io::Error;

        fn send(&mut self, cmd: &TwistCmd, hold: Duration) -> Result<(), Self::Error> {
            self.sent.push((*cmd, hold));
            Ok(())
        }
    }

    /// Fails after a number of commands.
    struct Flaky(usize);

    impl ControlSink for Flaky {
        type Error = std::io::Error;

        fn send(&mut self, _: &TwistCmd, _: Duration) -> Result<(), Self::Error> {
            if self.0 == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "base offline"));
            }
            self.0 -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_controls() {
        let mut sink = Recorder::default();
        let controls = [Control::new(1.0, 0.0), Control::new(1.0, -FRAC_PI_2)];
        let dwell = seconds(0.6);

        assert_eq!(dispatch_controls(&mut sink, &controls, dwell).unwrap(), 2);
        assert_eq!(sink.sent.len(), 2);
        assert_eq!(sink.sent[0].0, TwistCmd::planar(1.0, 0.0));
        assert_eq!(sink.sent[1].0, TwistCmd::planar(1.0, -FRAC_PI_2));
        assert!(sink.sent.iter().all(|(_, d)| *d == Duration::from_millis(600)));
    }

    #[test]
    fn test_dispatch_discrete() {
        let mut sink = Recorder::default();
        let motions = [DiscreteMotion::Forward, DiscreteMotion::TurnRight, DiscreteMotion::ArcLeft];

        assert_eq!(dispatch_discrete(&mut sink, &motions, seconds(0.6), 2).unwrap(), 6);

        let cmds: Vec<TwistCmd> = sink.sent.iter().map(|(c, _)| *c).collect();
        assert_eq!(cmds[0], cmds[1]);
        assert_eq!(cmds[0], TwistCmd::planar(1.0, 0.0));
        assert_eq!(cmds[2], TwistCmd::planar(0.0, -FRAC_PI_2));
        assert_eq!(cmds[4], TwistCmd::planar(FRAC_PI_2, FRAC_PI_2));
        assert_eq!(cmds[5], cmds[4]);
    }

    #[test]
    fn test_dispatch_error() {
        let mut sink = Flaky(3);
        let motions = [DiscreteMotion::Forward; 3];
        assert!(dispatch_discrete(&mut sink, &motions, seconds(0.0), 2).is_err());
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(0.6), Duration::from_millis(600));
        assert_eq!(seconds(-1.0), Duration::from_secs(0));
        assert_eq!(seconds(std::f64::NAN), Duration::from_secs(0));
    }
}
