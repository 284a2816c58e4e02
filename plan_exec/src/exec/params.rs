//! Policy executor parameters

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    /// Time each command is held before the next is sent.
    ///
    /// Units: seconds
    pub dwell_s: f64,

    /// Time to wait after a discrete motion before reading the pose again.
    ///
    /// Units: seconds
    pub settle_s: f64,

    /// Number of times each discrete motion's command is sent. Each send covers one motion
    /// period, so two sends make up a full discrete motion.
    pub discrete_repeats: usize,

    /// Maximum number of policy steps before execution gives up.
    pub max_steps: usize,

    /// Seed for the noise generator. If not given the generator is seeded from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for ExecParams {
    fn default() -> Self {
        Self {
            dwell_s: 0.6,
            settle_s: 1.0,
            discrete_repeats: 2,
            max_steps: 1000,
            rng_seed: None,
        }
    }
}
