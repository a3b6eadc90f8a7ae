pub mod compiler;
pub mod config;
pub mod exercise;
pub mod model;
pub mod task_graph;
pub mod util;

#[cfg(test)]
mod test;
