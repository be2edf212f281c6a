use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ControlObjective, RhcError, VarMap};

/// A bound on one variable, declared as part of the problem but not
/// enforced by the unconstrained optimizer. Carried so a future
/// constrained backend (or a post-hoc validation step) can consume it
/// without changing the controller contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub variable: String,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// The declared-but-unenforced constraints of a control problem.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Read-only configuration of one control problem: per controlled
/// variable an active flag, a weight and an objective, plus the single
/// optimization horizon shared by all of them.
///
/// The flag lets operators disable a controlled variable without
/// removing its configuration; the weight trades off competing
/// objectives. Lookups are checked: a controlled variable that appears
/// in a world state but not here is a configuration error, never a
/// silent default.
pub struct MpcProblem {
    active_flags: VarMap<String, bool>,
    weights: VarMap<String, f64>,
    control_objectives: VarMap<String, Box<dyn ControlObjective>>,
    optimisation_horizon: f64,
    constraints: ConstraintSet,
}

/// The plain-data part of a problem's configuration, detached from the
/// objective trait objects so it can be dumped for logs or diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProblemConfig {
    pub active_flags: VarMap<String, bool>,
    pub weights: VarMap<String, f64>,
    pub optimisation_horizon: f64,
    pub constraints: ConstraintSet,
}

impl MpcProblem {
    pub fn builder() -> MpcProblemBuilder {
        MpcProblemBuilder::default()
    }

    /// Snapshot of the flags, weights, horizon and constraints.
    pub fn config(&self) -> ProblemConfig {
        ProblemConfig {
            active_flags: self.active_flags.clone(),
            weights: self.weights.clone(),
            optimisation_horizon: self.optimisation_horizon,
            constraints: self.constraints.clone(),
        }
    }

    pub fn active_flag(&self, cv: &str) -> Result<bool, RhcError> {
        self.active_flags
            .get_by(cv)
            .copied()
            .ok_or_else(|| RhcError::MissingCvConfig {
                cv: cv.to_string(),
                map: "active_flags",
            })
    }

    pub fn weight(&self, cv: &str) -> Result<f64, RhcError> {
        self.weights
            .get_by(cv)
            .copied()
            .ok_or_else(|| RhcError::MissingCvConfig {
                cv: cv.to_string(),
                map: "weights",
            })
    }

    pub fn objective(&self, cv: &str) -> Result<&dyn ControlObjective, RhcError> {
        self.control_objectives
            .get_by(cv)
            .map(|o| o.as_ref())
            .ok_or_else(|| RhcError::MissingCvConfig {
                cv: cv.to_string(),
                map: "control_objectives",
            })
    }

    /// The forward time window, in seconds, over which predicted
    /// deviation is integrated.
    pub fn optimisation_horizon(&self) -> f64 {
        self.optimisation_horizon
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }
}

#[derive(Default)]
pub struct MpcProblemBuilder {
    active_flags: VarMap<String, bool>,
    weights: VarMap<String, f64>,
    control_objectives: VarMap<String, Box<dyn ControlObjective>>,
    optimisation_horizon: Option<f64>,
    constraints: ConstraintSet,
}

impl MpcProblemBuilder {
    /// Configures one controlled variable: whether it contributes to
    /// the cost, its weight, and its objective.
    pub fn cv(
        mut self,
        name: impl Into<String>,
        active: bool,
        weight: f64,
        objective: impl ControlObjective + 'static,
    ) -> Self {
        let name = name.into();
        self.active_flags.insert(name.clone(), active);
        self.weights.insert(name.clone(), weight);
        self.control_objectives.insert(name, Box::new(objective));
        self
    }

    pub fn optimisation_horizon(mut self, horizon: f64) -> Self {
        self.optimisation_horizon = Some(horizon);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn build(self) -> Result<MpcProblem, RhcError> {
        let optimisation_horizon = self
            .optimisation_horizon
            .ok_or_else(|| RhcError::InvalidProblem("optimisation horizon not set".into()))?;
        if !(optimisation_horizon > 0.0 && optimisation_horizon.is_finite()) {
            return Err(RhcError::InvalidProblem(format!(
                "optimisation horizon must be positive and finite, got {optimisation_horizon}"
            )));
        }
        for (cv, weight) in self.weights.iter() {
            if !(*weight >= 0.0 && weight.is_finite()) {
                return Err(RhcError::InvalidProblem(format!(
                    "weight for `{cv}` must be non-negative and finite, got {weight}"
                )));
            }
        }
        Ok(MpcProblem {
            active_flags: self.active_flags,
            weights: self.weights,
            control_objectives: self.control_objectives,
            optimisation_horizon,
            constraints: self.constraints,
        })
    }
}
