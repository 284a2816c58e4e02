//! # Policy Table
//!
//! Maps every discrete state to the action to take there. On disk the table is a JSON object
//! keyed by `"x,y,h"` strings, each value being the action's `[linear, turn]` pair:
//!
//! ```json
//! { "1,7,1": [1, 0], "1,7,2": [0, -1] }
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, convert::TryFrom, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::discrete::{DiscreteAction, DiscreteState, StateParseError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, [i32; 2]>",
    try_from = "BTreeMap<String, [f64; 2]>"
)]
pub struct PolicyTable {
    actions: BTreeMap<DiscreteState, DiscreteAction>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Invalid state key {0:?}: {1}")]
    InvalidKey(String, StateParseError),

    #[error("State {0} has an unknown action {1:?}")]
    UnknownAction(String, [f64; 2]),

    #[error("Could not access the policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not (de)serialise the policy: {0}")]
    Json(#[from] serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action for a state, returning the previous one if there was one.
    pub fn insert(&mut self, state: DiscreteState, action: DiscreteAction) -> Option<DiscreteAction> {
        self.actions.insert(state, action)
    }

    pub fn get(&self, state: &DiscreteState) -> Option<DiscreteAction> {
        self.actions.get(state).copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DiscreteState, &DiscreteAction)> {
        self.actions.iter()
    }

    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PolicyError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl From<PolicyTable> for BTreeMap<String, [i32; 2]> {
    fn from(table: PolicyTable) -> Self {
        table
            .actions
            .into_iter()
            .map(|(s, a)| (s.to_string(), a.pair()))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, [f64; 2]>> for PolicyTable {
    type Error = PolicyError;

    /// Pairs may be written as integers or floats, but must be whole numbers.
    fn try_from(raw: BTreeMap<String, [f64; 2]>) -> Result<Self, Self::Error> {
        let mut table = Self::new();

        for (key, pair) in raw {
            let state: DiscreteState = key
                .parse()
                .map_err(|e| PolicyError::InvalidKey(key.clone(), e))?;

            let action = whole_pair(pair)
                .and_then(DiscreteAction::from_pair)
                .ok_or_else(|| PolicyError::UnknownAction(key.clone(), pair))?;

            table.insert(state, action);
        }

        Ok(table)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn whole_pair(pair: [f64; 2]) -> Option<[i32; 2]> {
    let whole = |v: f64| {
        if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 {
            Some(v as i32)
        } else {
            None
        }
    };

    Some([whole(pair[0])?, whole(pair[1])?])
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
