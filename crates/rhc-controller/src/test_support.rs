//! Small models and objectives shared by the controller tests.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use rhc_core::{ControlObjective, ProcessModel, RhcError, WorldState};

/// A process that never changes: `progress` returns the state as-is.
pub struct ConstantModel;

impl ProcessModel for ConstantModel {
    fn progress(&self, _t: f64, state: &WorldState) -> Result<WorldState, RhcError> {
        Ok(state.clone())
    }
}

/// An objective that ignores the state and reports a fixed distance.
pub struct FixedDistance(pub f64);

impl ControlObjective for FixedDistance {
    fn distance_until_satisfied(&self, _state: &WorldState) -> Result<f64, RhcError> {
        Ok(self.0)
    }
}

/// A process where one variable grows linearly: `v(t) = v(0) + rate * t`.
pub struct RampModel {
    pub variable: String,
    pub rate: f64,
}

impl ProcessModel for RampModel {
    fn progress(&self, t: f64, state: &WorldState) -> Result<WorldState, RhcError> {
        let current = state
            .value(&self.variable)?
            .to_f64()
            .ok_or_else(|| RhcError::NonFiniteValue(self.variable.clone()))?;
        let predicted = Decimal::from_f64(current + self.rate * t)
            .ok_or_else(|| RhcError::NonFiniteValue(self.variable.clone()))?;
        state.apply_assignment(vec![(self.variable.clone(), predicted)])
    }
}

/// A process that settles instantly: the controlled variable takes the
/// manipulated variable's value at any `t`.
pub struct DirectModel {
    pub mv: String,
    pub cv: String,
}

impl ProcessModel for DirectModel {
    fn progress(&self, _t: f64, state: &WorldState) -> Result<WorldState, RhcError> {
        let setting = state.value(&self.mv)?;
        state.apply_assignment(vec![(self.cv.clone(), setting)])
    }
}
