//! Task graph and scheduler errors.

use super::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("dependency cycle between stages: {}", join(stages))]
    Cycle { stages: Vec<Stage> },

    #[error("edge refers to stage `{stage}` which is not in the graph")]
    UnknownStage { stage: Stage },

    #[error("stage `{stage}` failed")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("interrupted, skipped: {}", join(skipped))]
    Aborted { skipped: Vec<Stage> },
}

fn join(stages: &[Stage]) -> String {
    stages
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}
