use thiserror::Error;

/// Errors produced while evaluating or optimizing a control problem.
#[derive(Debug, Error)]
pub enum RhcError {
    /// A variable name was used that is not a key of the world state's
    /// value map.
    #[error("variable `{0}` is not present in the world state")]
    UnknownVariable(String),
    /// A controlled variable in the world state has no entry in one of
    /// the problem's configuration maps. Silently defaulting here would
    /// corrupt the cost landscape undetectably, so this fails fast.
    #[error("controlled variable `{cv}` has no entry in `{map}`")]
    MissingCvConfig { cv: String, map: &'static str },
    /// The model or objective produced a non-finite penalty value. The
    /// affected cost evaluation is abandoned rather than coerced to
    /// some arbitrary number that would mislead the optimizer.
    #[error("non-finite penalty at t = {t}")]
    NonFinitePenalty { t: f64 },
    /// A variable value could not cross the float/decimal boundary
    /// (NaN or infinite candidate).
    #[error("non-finite value for variable `{0}`")]
    NonFiniteValue(String),
    #[error("invalid problem configuration: {0}")]
    InvalidProblem(String),
}
