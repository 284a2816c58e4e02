//! # Actuation Noise
//!
//! A forward action doesn't always drive straight: it can slip into an arc to either side. The
//! same model is used by the MDP planner to weight transition outcomes and by the executor to
//! perturb the actions it dispatches, so executed behaviour matches what the policy was
//! optimised against.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use rand::Rng;
use serde::Deserialize;

use crate::discrete::{DiscreteAction, DiscreteMotion};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ForwardNoise {
    /// Probability a forward action drives straight.
    pub forward_prob: f64,

    /// Probability a forward action slips into a left arc.
    pub arc_left_prob: f64,

    /// Probability a forward action slips into a right arc.
    pub arc_right_prob: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("Noise probabilities must be non-negative and sum to 1, found {0}, {1}, {2}")]
pub struct InvalidNoise(pub f64, pub f64, pub f64);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ForwardNoise {
    /// Check the probabilities form a distribution.
    pub fn validate(&self) -> Result<(), InvalidNoise> {
        let probs = [self.forward_prob, self.arc_left_prob, self.arc_right_prob];
        let sum: f64 = probs.iter().sum();

        if probs.iter().all(|p| p.is_finite() && *p >= 0.0) && (sum - 1.0).abs() < 1e-9 {
            Ok(())
        } else {
            Err(InvalidNoise(probs[0], probs[1], probs[2]))
        }
    }

    /// The possible motions resulting from a nominal action, with their probabilities.
    ///
    /// Turns are deterministic.
    pub fn outcomes(&self, action: DiscreteAction) -> Vec<(f64, DiscreteMotion)> {
        match action {
            DiscreteAction::Forward => vec![
                (self.forward_prob, DiscreteMotion::Forward),
                (self.arc_left_prob, DiscreteMotion::ArcLeft),
                (self.arc_right_prob, DiscreteMotion::ArcRight),
            ],
            a => vec![(1.0, a.into())],
        }
    }

    /// Pick the motion for a nominal action given a uniform sample in [0, 1).
    pub fn resolve(&self, action: DiscreteAction, sample: f64) -> DiscreteMotion {
        match action {
            DiscreteAction::Forward => {
                if sample < self.forward_prob {
                    DiscreteMotion::Forward
                } else if sample < 1.0 - self.arc_right_prob {
                    DiscreteMotion::ArcLeft
                } else {
                    DiscreteMotion::ArcRight
                }
            }
            a => a.into(),
        }
    }

    /// Draw the motion executed for a nominal action.
    pub fn sample<R: Rng + ?Sized>(&self, action: DiscreteAction, rng: &mut R) -> DiscreteMotion {
        self.resolve(action, rng.gen::<f64>())
    }
}

impl Default for ForwardNoise {
    fn default() -> Self {
        Self {
            forward_prob: 0.9,
            arc_left_prob: 0.05,
            arc_right_prob: 0.05,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
