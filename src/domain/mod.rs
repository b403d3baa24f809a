pub mod problem;
pub mod schedule;

pub use problem::*;
pub use schedule::*;
