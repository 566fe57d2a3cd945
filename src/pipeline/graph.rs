//! Stage dependency graph.
//!
//! An edge `a → b` means `a` must complete before `b` starts. Stages without
//! a path between them may run concurrently.
//!
//! ```text
//! production:   clean ─┬─ styles ──┬─ files ─ revision ─ rewrite ─ inline [─ deploy]
//!                      └─ scripts ─┘
//! development:  styles   scripts
//! ```

use super::{PipelineError, Stage};
use crate::core::BuildMode;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    stages: Vec<Stage>,
    edges: Vec<(Stage, Stage)>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph for a full run in `mode`, optionally ending in `deploy`.
    pub fn for_mode(mode: BuildMode, deploy: bool) -> Self {
        let mut graph = Self::new();
        if mode.is_dev() {
            graph.add_stage(Stage::Styles);
            graph.add_stage(Stage::Scripts);
            return graph;
        }

        for stage in [
            Stage::Clean,
            Stage::Styles,
            Stage::Scripts,
            Stage::Files,
            Stage::Revision,
            Stage::Rewrite,
            Stage::Inline,
        ] {
            graph.add_stage(stage);
        }
        graph.add_edge(Stage::Clean, Stage::Styles);
        graph.add_edge(Stage::Clean, Stage::Scripts);
        graph.add_edge(Stage::Styles, Stage::Files);
        graph.add_edge(Stage::Scripts, Stage::Files);
        graph.add_edge(Stage::Files, Stage::Revision);
        graph.add_edge(Stage::Revision, Stage::Rewrite);
        graph.add_edge(Stage::Rewrite, Stage::Inline);

        if deploy {
            graph.add_stage(Stage::Deploy);
            graph.add_edge(Stage::Inline, Stage::Deploy);
        }
        graph
    }

    /// Graph holding one stage.
    pub fn single(stage: Stage) -> Self {
        let mut graph = Self::new();
        graph.add_stage(stage);
        graph
    }

    pub fn add_stage(&mut self, stage: Stage) {
        if !self.stages.contains(&stage) {
            self.stages.push(stage);
        }
    }

    /// `before` must complete before `after` starts.
    pub fn add_edge(&mut self, before: Stage, after: Stage) {
        if !self.edges.contains(&(before, after)) {
            self.edges.push((before, after));
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn predecessors(&self, stage: Stage) -> impl Iterator<Item = Stage> + '_ {
        self.edges
            .iter()
            .filter(move |(_, after)| *after == stage)
            .map(|(before, _)| *before)
    }

    pub fn successors(&self, stage: Stage) -> impl Iterator<Item = Stage> + '_ {
        self.edges
            .iter()
            .filter(move |(before, _)| *before == stage)
            .map(|(_, after)| *after)
    }

    /// Check edges and acyclicity; returns a topological order.
    ///
    /// Ties keep insertion order, so the result is deterministic.
    pub fn validate(&self) -> Result<Vec<Stage>, PipelineError> {
        for &(before, after) in &self.edges {
            for stage in [before, after] {
                if !self.contains(stage) {
                    return Err(PipelineError::UnknownStage { stage });
                }
            }
        }

        let mut pending: Vec<usize> = self
            .stages
            .iter()
            .map(|&s| self.predecessors(s).count())
            .collect();
        let mut ready: VecDeque<Stage> = self
            .stages
            .iter()
            .zip(&pending)
            .filter(|(_, n)| **n == 0)
            .map(|(s, _)| *s)
            .collect();

        let mut order = Vec::with_capacity(self.stages.len());
        while let Some(stage) = ready.pop_front() {
            order.push(stage);
            for next in self.successors(stage) {
                let idx = self.index(next);
                pending[idx] -= 1;
                if pending[idx] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() < self.stages.len() {
            let stages = self
                .stages
                .iter()
                .copied()
                .filter(|s| !order.contains(s))
                .collect();
            return Err(PipelineError::Cycle { stages });
        }
        Ok(order)
    }

    fn index(&self, stage: Stage) -> usize {
        self.stages
            .iter()
            .position(|&s| s == stage)
            .unwrap_or_default()
    }
}
