use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{RhcError, VarMap};

/// An immutable snapshot of the process variables at one instant.
///
/// Variable values carry decimal semantics (they are reported to, and
/// actuated on, external systems that care about exact decimal
/// representation); conversion to floating point happens only at the
/// optimizer boundary.
///
/// The names in `mvs` and `cvs` partition the interesting subset of the
/// value map: manipulated variables the controller is free to set, and
/// controlled variables it tries to drive to target. Every name in
/// either list must be a key of `values`; this is checked on
/// construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldState {
    values: VarMap<String, Decimal>,
    mvs: Vec<String>,
    cvs: Vec<String>,
}

impl WorldState {
    /// Creates a world state, validating that every manipulated and
    /// controlled variable name is a key of the value map.
    pub fn new(
        values: VarMap<String, Decimal>,
        mvs: Vec<String>,
        cvs: Vec<String>,
    ) -> Result<Self, RhcError> {
        for name in mvs.iter().chain(cvs.iter()) {
            if !values.contains_key(name) {
                return Err(RhcError::UnknownVariable(name.clone()));
            }
        }
        Ok(Self { values, mvs, cvs })
    }

    /// The manipulated-variable names, in their defining order.
    pub fn mvs(&self) -> &[String] {
        &self.mvs
    }

    /// The controlled-variable names, in their defining order.
    pub fn cvs(&self) -> &[String] {
        &self.cvs
    }

    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.values.get_by(name).copied()
    }

    /// Looks up a variable's value, failing if the name is unknown.
    pub fn value(&self, name: &str) -> Result<Decimal, RhcError> {
        self.get(name)
            .ok_or_else(|| RhcError::UnknownVariable(name.to_string()))
    }

    /// Returns a new world state with the given assignments overridden.
    ///
    /// This never mutates `self`: candidate states explored by the
    /// optimizer are all derived copies of the same base snapshot.
    /// Overriding a name that is not already a variable of this state
    /// is an error, not an insertion.
    pub fn apply_assignment<I>(&self, overrides: I) -> Result<WorldState, RhcError>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut values = self.values.clone();
        for (name, value) in overrides {
            if !values.contains_key(&name) {
                return Err(RhcError::UnknownVariable(name));
            }
            values.insert(name, value);
        }
        Ok(WorldState {
            values,
            mvs: self.mvs.clone(),
            cvs: self.cvs.clone(),
        })
    }
}

impl fmt::Display for WorldState {
    /// JSON rendering, used when logging snapshots and derived
    /// candidate states.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// The new value to apply to one manipulated variable for the current
/// control cycle. One action is produced per manipulated variable; the
/// actuation layer downstream consumes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlAction {
    pub variable: String,
    pub value: Decimal,
}

impl ControlAction {
    pub fn new(variable: impl Into<String>, value: Decimal) -> Self {
        Self {
            variable: variable.into(),
            value,
        }
    }
}
