use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{RhcError, WorldState};

/// A forward-time prediction of the process being controlled.
///
/// `progress` answers: starting from `state` and holding its
/// manipulated variables constant, what does the world look like after
/// `t` seconds? It must be a pure function of `(t, state)` -- the
/// quadrature routine samples it at arbitrary, non-monotonic offsets.
pub trait ProcessModel {
    fn progress(&self, t: f64, state: &WorldState) -> Result<WorldState, RhcError>;
}

/// A per-controlled-variable target, expressed as a distance.
///
/// Returns how far the given (predicted) world state is from satisfying
/// this objective; 0 means at target. The sign is irrelevant to the
/// cost (the penalty squares it), so implementations may return a
/// signed overshoot/undershoot distance or an absolute one.
pub trait ControlObjective {
    fn distance_until_satisfied(&self, state: &WorldState) -> Result<f64, RhcError>;
}

/// Linear distance of one variable from a fixed setpoint,
/// `target - current`.
#[derive(Clone, Debug)]
pub struct SetpointObjective {
    variable: String,
    target: Decimal,
}

impl SetpointObjective {
    pub fn new(variable: impl Into<String>, target: Decimal) -> Self {
        Self {
            variable: variable.into(),
            target,
        }
    }
}

impl ControlObjective for SetpointObjective {
    fn distance_until_satisfied(&self, state: &WorldState) -> Result<f64, RhcError> {
        let current = state.value(&self.variable)?;
        (self.target - current)
            .to_f64()
            .ok_or_else(|| RhcError::NonFiniteValue(self.variable.clone()))
    }
}
