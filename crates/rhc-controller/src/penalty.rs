use log::debug;
use rhc_core::{ControlObjective, ProcessModel, RhcError, WorldState};

/// Instantaneous penalty for one objective at time offset `t`.
///
/// Predicts the world `t` seconds ahead (holding the manipulated
/// variables of `state` constant), squares the objective's distance so
/// overshoot and undershoot both cost, and clamps at zero to tolerate
/// objectives that report a negative "already past target" distance.
///
/// Pure; the quadrature routine samples it at arbitrary `t` values.
pub fn pointwise_penalty<M: ProcessModel + ?Sized>(
    t: f64,
    objective: &dyn ControlObjective,
    model: &M,
    state: &WorldState,
) -> Result<f64, RhcError> {
    let predicted = model.progress(t, state)?;
    let distance = objective.distance_until_satisfied(&predicted)?;
    if !distance.is_finite() {
        return Err(RhcError::NonFinitePenalty { t });
    }
    debug!("predicted world has a distance of {distance} after {t} seconds");
    Ok(f64::max(0.0, distance * distance))
}
