pub mod builder;
pub mod flattener;
pub mod linearizer;
pub mod strategies;
pub mod types;

pub use builder::*;
pub use flattener::*;
pub use linearizer::*;
pub use strategies::*;
pub use types::*;
