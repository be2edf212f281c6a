mod error;
mod model;
mod problem;
mod var_map;
mod world;

pub use error::*;
pub use model::*;
pub use problem::*;
pub use var_map::*;
pub use world::*;
