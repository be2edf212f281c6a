use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use rhc_core::{ProcessModel, RhcError, WorldState};

/// First-order lag plant: the temperature relaxes exponentially toward
/// the heater setting with time constant `tau`,
/// `T(t) = u + (T(0) - u) * exp(-t / tau)`.
#[derive(Clone, Debug)]
pub struct FirstOrderLag {
    tau: f64,
}

impl FirstOrderLag {
    pub fn new(tau: f64) -> Self {
        Self { tau }
    }
}

impl ProcessModel for FirstOrderLag {
    fn progress(&self, t: f64, state: &WorldState) -> Result<WorldState, RhcError> {
        let heater = to_f64(state, "heater")?;
        let temperature = to_f64(state, "temperature")?;
        let predicted = heater + (temperature - heater) * (-t / self.tau).exp();
        let predicted = Decimal::from_f64(predicted)
            .ok_or_else(|| RhcError::NonFiniteValue("temperature".to_string()))?;
        state.apply_assignment(vec![("temperature".to_string(), predicted)])
    }
}

fn to_f64(state: &WorldState, name: &str) -> Result<f64, RhcError> {
    state
        .value(name)?
        .to_f64()
        .ok_or_else(|| RhcError::NonFiniteValue(name.to_string()))
}
