mod catalog;
mod definition;
mod plan;
mod task;

pub use catalog::*;
pub use definition::*;
pub use plan::*;
pub use task::*;
