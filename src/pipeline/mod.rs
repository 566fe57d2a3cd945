//! Task graph and scheduler.
//!
//! The build is an explicit DAG of [`Stage`]s. [`Scheduler::run`] executes
//! it with maximal concurrency allowed by the edges and stops launching work
//! at the first failure.

mod error;
mod graph;
mod scheduler;
mod stage;

pub use error::PipelineError;
pub use graph::TaskGraph;
pub use scheduler::{RunSummary, Scheduler, StageRunner};
pub use stage::Stage;
