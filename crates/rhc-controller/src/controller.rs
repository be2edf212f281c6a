use anyhow::Result;
use argmin::core::{Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use log::{debug, info, warn};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use rhc_core::{ControlAction, MpcProblem, ProcessModel, RhcError, WorldState};

use crate::cost::CandidateCost;

/// Standard deviation of the simplex's cost values below which the
/// search is considered converged.
const SD_TOLERANCE: f64 = 0.1;
/// Iteration cap for one control cycle's optimization.
const MAX_ITERS: u64 = 100;
/// Relative offset used to spread the initial simplex around the guess.
const SIMPLEX_STEP: f64 = 0.1;

/// The receding-horizon optimization driver.
///
/// Each call to [`calculate_control_actions`](Self::calculate_control_actions)
/// is a fresh, stateless optimization over the latest world snapshot:
/// the manipulated variables are the search space, and the horizon cost
/// evaluator provides the objective. Only the resulting first action set
/// is emitted; the rest of the implied trajectory is discarded.
pub struct MpcController<M> {
    problem: MpcProblem,
    model: M,
}

impl<M: ProcessModel> MpcController<M> {
    pub fn new(problem: MpcProblem, model: M) -> Self {
        Self { problem, model }
    }

    pub fn problem(&self) -> &MpcProblem {
        &self.problem
    }

    /// Runs one control cycle: searches for the manipulated-variable
    /// settings minimizing the predicted deviation of the controlled
    /// variables over the optimization horizon, and returns one action
    /// per manipulated variable.
    ///
    /// `time_delta` is part of the contract for timing bookkeeping by
    /// callers; the optimization itself does not depend on it.
    ///
    /// Configuration mismatches and non-finite cost evaluations are
    /// hard failures. Hitting the iteration cap is not: the best point
    /// found so far is used and the condition is logged.
    pub fn calculate_control_actions(
        &self,
        _time_delta: f64,
        latest_world: &WorldState,
    ) -> Result<Vec<ControlAction>> {
        info!("controller starting step");

        // Captured once; both the initial guess and the result vector
        // are laid out in this order.
        let mv_order: Vec<String> = latest_world.mvs().to_vec();
        if mv_order.is_empty() {
            debug!("no manipulated variables, nothing to optimize");
            return Ok(Vec::new());
        }

        let initial_guess = mv_order
            .iter()
            .map(|name| {
                latest_world
                    .value(name)?
                    .to_f64()
                    .ok_or_else(|| RhcError::NonFiniteValue(name.clone()))
            })
            .collect::<Result<Vec<f64>, RhcError>>()?;
        info!("optimization initial guess: {initial_guess:?}");

        let cost = CandidateCost::new(latest_world, &self.model, &self.problem, &mv_order);
        let simplex = initial_simplex(&initial_guess);
        // The solver unwraps cost values while seeding the simplex, so
        // configuration mismatches and non-finite penalties must be
        // surfaced as typed errors before it takes over.
        for vertex in &simplex {
            cost.evaluate(vertex)?;
        }
        let solver = NelderMead::new(simplex).with_sd_tolerance(SD_TOLERANCE)?;
        let result = Executor::new(cost, solver)
            .configure(|state| state.max_iters(MAX_ITERS))
            .run()?;

        let state = result.state();
        match state.get_termination_status() {
            TerminationStatus::Terminated(TerminationReason::MaxItersReached) => warn!(
                "optimizer hit the {MAX_ITERS}-iteration cap without converging; \
                 using the best point found"
            ),
            status => debug!(
                "optimizer finished after {} iterations: {status:?}",
                state.get_iter()
            ),
        }
        info!("optimization best cost: {}", state.get_best_cost());

        let best = state.get_best_param().cloned().unwrap_or(initial_guess);
        let actions = mv_order
            .into_iter()
            .zip(best)
            .map(|(name, value)| match Decimal::from_f64(value) {
                Some(value) => Ok(ControlAction::new(name, value)),
                None => Err(RhcError::NonFiniteValue(name)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(actions)
    }
}

/// Initial simplex for Nelder-Mead: the guess itself plus one vertex
/// per dimension, offset along that axis.
fn initial_simplex(guess: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(guess.len() + 1);
    simplex.push(guess.to_vec());
    for i in 0..guess.len() {
        let mut vertex = guess.to_vec();
        vertex[i] += f64::max(SIMPLEX_STEP, vertex[i].abs() * SIMPLEX_STEP);
        simplex.push(vertex);
    }
    simplex
}
