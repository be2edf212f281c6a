mod controller;
mod cost;
mod penalty;
#[cfg(test)]
mod test_support;

pub use controller::MpcController;
pub use cost::{evaluate_world_state, CandidateCost};
pub use penalty::pointwise_penalty;
