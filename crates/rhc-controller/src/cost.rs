use std::cell::Cell;

use argmin::core::CostFunction;
use log::{debug, info, warn};
use quadrature::integrate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use rhc_core::{MpcProblem, ProcessModel, RhcError, WorldState};

use crate::penalty::pointwise_penalty;

/// Target absolute error handed to the adaptive quadrature routine.
const QUAD_TARGET_ABS_ERR: f64 = 1e-6;

/// Scores a world state against the problem's objectives. Higher is worse.
///
/// For each controlled variable, the pointwise penalty is integrated
/// over `[0, horizon]` and the result scaled by the variable's weight;
/// an inactive flag or a zero weight removes the term entirely. The
/// total is recomputed from scratch on every call -- cost has no
/// identity beyond one evaluation.
pub fn evaluate_world_state<M: ProcessModel>(
    state: &WorldState,
    model: &M,
    problem: &MpcProblem,
) -> Result<f64, RhcError> {
    let horizon = problem.optimisation_horizon();
    let mut total = 0.0;
    for cv in state.cvs() {
        // All three lookups happen before the gate, so a configuration
        // mismatch fails fast even for a disabled variable.
        let active = problem.active_flag(cv)?;
        let weight = problem.weight(cv)?;
        let objective = problem.objective(cv)?;

        if !active || weight == 0.0 {
            debug!("cv `{cv}` gated out (active: {active}, weight: {weight})");
            continue;
        }

        // The quadrature callback is infallible and `f64::max(0.0, NaN)`
        // evaluates to 0.0, so a sentinel return value cannot signal
        // failure; the first error is carried out through this cell.
        let failure: Cell<Option<RhcError>> = Cell::new(None);
        let result = integrate(
            |t| match pointwise_penalty(t, objective, model, state) {
                Ok(penalty) => penalty,
                Err(err) => {
                    let first = failure.take();
                    failure.set(Some(first.unwrap_or(err)));
                    0.0
                }
            },
            0.0,
            horizon,
            QUAD_TARGET_ABS_ERR,
        );
        if let Some(err) = failure.take() {
            warn!("cost integration for cv `{cv}` failed: {err}");
            return Err(err);
        }
        if result.error_estimate > f64::max(QUAD_TARGET_ABS_ERR, 1e-3 * result.integral.abs()) {
            warn!(
                "quadrature error estimate for cv `{cv}` is large: {} (integral {})",
                result.error_estimate, result.integral
            );
        }
        debug!("integration value for cv `{cv}`: {}", result.integral);
        total += weight * result.integral;
    }
    info!("cost of world: {total}");
    Ok(total)
}

/// The adapter between the real-vector optimizer interface and the
/// domain-typed world state.
///
/// Borrows an immutable base state, model, problem and the manipulated-
/// variable ordering captured at the start of the control cycle; each
/// call zips the candidate vector onto that ordering, derives an
/// overridden state and evaluates it. No state is kept across calls.
pub struct CandidateCost<'a, M> {
    base_state: &'a WorldState,
    model: &'a M,
    problem: &'a MpcProblem,
    mv_order: &'a [String],
}

impl<'a, M: ProcessModel> CandidateCost<'a, M> {
    pub fn new(
        base_state: &'a WorldState,
        model: &'a M,
        problem: &'a MpcProblem,
        mv_order: &'a [String],
    ) -> Self {
        Self {
            base_state,
            model,
            problem,
            mv_order,
        }
    }

    /// Cost of one candidate manipulated-variable vector.
    ///
    /// The vector is interpreted positionally against the captured mv
    /// ordering; f64 -> decimal conversion happens here, at the
    /// optimizer boundary.
    pub fn evaluate(&self, mv_values: &[f64]) -> Result<f64, RhcError> {
        debug_assert_eq!(mv_values.len(), self.mv_order.len());
        let overrides = self
            .mv_order
            .iter()
            .zip(mv_values.iter())
            .map(|(name, &value)| {
                Decimal::from_f64(value)
                    .map(|value| (name.clone(), value))
                    .ok_or_else(|| RhcError::NonFiniteValue(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!("cost function being computed for mvs: {overrides:?}");

        let updated = self.base_state.apply_assignment(overrides)?;
        debug!("updated world: {updated}");
        evaluate_world_state(&updated, self.model, self.problem)
    }
}

impl<M: ProcessModel> CostFunction for CandidateCost<'_, M> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, mv_values: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.evaluate(mv_values)?)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::{ConstantModel, FixedDistance, RampModel};
    use rhc_core::{MpcProblem, SetpointObjective, VarMap};

    fn state(entries: &[(&str, Decimal)], mvs: &[&str], cvs: &[&str]) -> WorldState {
        let values: VarMap<String, Decimal> = entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        WorldState::new(
            values,
            mvs.iter().map(|s| s.to_string()).collect(),
            cvs.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_cost_at_target() {
        let world = state(&[("temperature", dec!(100))], &[], &["temperature"]);
        let problem = MpcProblem::builder()
            .cv(
                "temperature",
                true,
                1.0,
                SetpointObjective::new("temperature", dec!(100)),
            )
            .optimisation_horizon(1.0)
            .build()
            .unwrap();

        let cost = evaluate_world_state(&world, &ConstantModel, &problem).unwrap();
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_integral_matches_analytic_value() {
        // temperature(t) = t, target 2, horizon 1:
        // integral of (2 - t)^2 over [0, 1] = 7/3.
        let world = state(&[("temperature", dec!(0))], &[], &["temperature"]);
        let problem = MpcProblem::builder()
            .cv(
                "temperature",
                true,
                1.0,
                SetpointObjective::new("temperature", dec!(2)),
            )
            .optimisation_horizon(1.0)
            .build()
            .unwrap();
        let model = RampModel {
            variable: "temperature".to_string(),
            rate: 1.0,
        };

        let cost = evaluate_world_state(&world, &model, &problem).unwrap();
        assert_relative_eq!(cost, 7.0 / 3.0, max_relative = 1e-3);
    }

    #[test]
    fn test_cost_scales_with_weight() {
        let world = state(&[("temperature", dec!(80))], &[], &["temperature"]);
        let build = |weight: f64| {
            MpcProblem::builder()
                .cv(
                    "temperature",
                    true,
                    weight,
                    SetpointObjective::new("temperature", dec!(100)),
                )
                .optimisation_horizon(1.0)
                .build()
                .unwrap()
        };

        let base = evaluate_world_state(&world, &ConstantModel, &build(1.0)).unwrap();
        let doubled = evaluate_world_state(&world, &ConstantModel, &build(2.0)).unwrap();
        assert!(base > 0.0);
        assert_relative_eq!(doubled, 2.0 * base, max_relative = 1e-9);
    }

    #[test]
    fn test_inactive_flag_equals_zero_weight() {
        let world = state(&[("temperature", dec!(80))], &[], &["temperature"]);
        let build = |active: bool, weight: f64| {
            MpcProblem::builder()
                .cv(
                    "temperature",
                    active,
                    weight,
                    SetpointObjective::new("temperature", dec!(100)),
                )
                .optimisation_horizon(1.0)
                .build()
                .unwrap()
        };

        let flagged_off = evaluate_world_state(&world, &ConstantModel, &build(false, 7.5)).unwrap();
        let zero_weight = evaluate_world_state(&world, &ConstantModel, &build(true, 0.0)).unwrap();
        assert_eq!(flagged_off, 0.0);
        assert_eq!(flagged_off, zero_weight);
    }

    #[test]
    fn test_all_terms_gated_out() {
        // One cv inactive with a huge weight, one active with weight 0:
        // every term is zeroed by either flag or weight.
        let world = state(
            &[("temperature", dec!(0)), ("pressure", dec!(0))],
            &[],
            &["temperature", "pressure"],
        );
        let problem = MpcProblem::builder()
            .cv(
                "temperature",
                false,
                1e12,
                SetpointObjective::new("temperature", dec!(500)),
            )
            .cv(
                "pressure",
                true,
                0.0,
                SetpointObjective::new("pressure", dec!(500)),
            )
            .optimisation_horizon(1.0)
            .build()
            .unwrap();

        let cost = evaluate_world_state(&world, &ConstantModel, &problem).unwrap();
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_missing_cv_config_fails_fast() {
        let world = state(&[("pressure", dec!(1))], &[], &["pressure"]);
        let problem = MpcProblem::builder()
            .cv(
                "temperature",
                true,
                1.0,
                SetpointObjective::new("temperature", dec!(100)),
            )
            .optimisation_horizon(1.0)
            .build()
            .unwrap();

        let err = evaluate_world_state(&world, &ConstantModel, &problem).unwrap_err();
        assert!(matches!(err, RhcError::MissingCvConfig { cv, .. } if cv == "pressure"));
    }

    #[test]
    fn test_non_finite_penalty_poisons_the_evaluation() {
        let world = state(&[("temperature", dec!(80))], &[], &["temperature"]);
        let problem = MpcProblem::builder()
            .cv("temperature", true, 1.0, FixedDistance(f64::NAN))
            .optimisation_horizon(1.0)
            .build()
            .unwrap();

        let err = evaluate_world_state(&world, &ConstantModel, &problem).unwrap_err();
        assert!(matches!(err, RhcError::NonFinitePenalty { .. }));
    }

    #[test]
    fn test_candidate_cost_identity() {
        // The candidate cost at the current mv values must equal the
        // evaluator applied directly to the unmodified state.
        let world = state(
            &[("heater", dec!(0.1)), ("temperature", dec!(80))],
            &["heater"],
            &["temperature"],
        );
        let problem = MpcProblem::builder()
            .cv(
                "temperature",
                true,
                1.0,
                SetpointObjective::new("temperature", dec!(100)),
            )
            .optimisation_horizon(1.0)
            .build()
            .unwrap();
        let mv_order = vec!["heater".to_string()];
        let candidate = CandidateCost::new(&world, &ConstantModel, &problem, &mv_order);

        let direct = evaluate_world_state(&world, &ConstantModel, &problem).unwrap();
        let via_vector = candidate.evaluate(&[0.1]).unwrap();
        assert_eq!(via_vector, direct);
    }

    #[test]
    fn test_candidate_cost_rejects_non_finite_vector() {
        let world = state(
            &[("heater", dec!(0)), ("temperature", dec!(80))],
            &["heater"],
            &["temperature"],
        );
        let problem = MpcProblem::builder()
            .cv(
                "temperature",
                true,
                1.0,
                SetpointObjective::new("temperature", dec!(100)),
            )
            .optimisation_horizon(1.0)
            .build()
            .unwrap();
        let mv_order = vec!["heater".to_string()];
        let candidate = CandidateCost::new(&world, &ConstantModel, &problem, &mv_order);

        let err = candidate.evaluate(&[f64::NAN]).unwrap_err();
        assert!(matches!(err, RhcError::NonFiniteValue(name) if name == "heater"));
    }
}
