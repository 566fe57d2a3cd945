//! Concurrent stage scheduler.
//!
//! Every stage whose predecessors have completed is started on its own
//! scoped thread; completions come back over a channel. After the first
//! failure nothing new is launched: stages already running finish, their
//! errors are logged, and the first error is returned. The interrupt flag is
//! checked before each launch.

use super::{PipelineError, Stage, TaskGraph};
use crate::core::is_shutdown;
use crate::log;
use crossbeam::channel;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

/// Executes one stage.
pub trait StageRunner: Sync {
    fn run(&self, stage: Stage) -> anyhow::Result<()>;
}

impl<F> StageRunner for F
where
    F: Fn(Stage) -> anyhow::Result<()> + Sync,
{
    fn run(&self, stage: Stage) -> anyhow::Result<()> {
        self(stage)
    }
}

/// Stages in the order they completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<Stage>,
}

pub struct Scheduler {
    interrupted: fn() -> bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Scheduler honoring the process-wide Ctrl+C flag.
    pub fn new() -> Self {
        Self {
            interrupted: is_shutdown,
        }
    }

    /// Scheduler with a custom interrupt check.
    pub fn with_interrupt(interrupted: fn() -> bool) -> Self {
        Self { interrupted }
    }

    pub fn run<R: StageRunner>(&self, graph: &TaskGraph, runner: &R) -> Result<RunSummary, PipelineError> {
        graph.validate()?;

        let stages = graph.stages();
        let mut pending: Vec<usize> = stages
            .iter()
            .map(|&s| graph.predecessors(s).count())
            .collect();
        let mut ready: VecDeque<Stage> = stages
            .iter()
            .zip(&pending)
            .filter(|(_, n)| **n == 0)
            .map(|(s, _)| *s)
            .collect();

        let mut completed = Vec::with_capacity(stages.len());
        let mut first_error: Option<PipelineError> = None;

        thread::scope(|scope| {
            let (tx, rx) = channel::unbounded::<(Stage, anyhow::Result<()>)>();
            let mut running = 0usize;

            loop {
                if first_error.is_none() && !(self.interrupted)() {
                    while let Some(stage) = ready.pop_front() {
                        crate::debug!("pipeline"; "starting {}", stage);
                        let tx = tx.clone();
                        scope.spawn(move || {
                            let result = catch_unwind(AssertUnwindSafe(|| runner.run(stage)))
                                .unwrap_or_else(|_| Err(anyhow::anyhow!("stage panicked")));
                            // Receiver outlives every sender in this scope
                            let _ = tx.send((stage, result));
                        });
                        running += 1;
                    }
                }

                if running == 0 {
                    break;
                }
                let Ok((stage, result)) = rx.recv() else {
                    break;
                };
                running -= 1;

                match result {
                    Ok(()) => {
                        completed.push(stage);
                        for next in graph.successors(stage) {
                            if let Some(idx) = stages.iter().position(|&s| s == next) {
                                pending[idx] -= 1;
                                if pending[idx] == 0 {
                                    ready.push_back(next);
                                }
                            }
                        }
                    }
                    Err(e) if first_error.is_none() => {
                        first_error = Some(PipelineError::StageFailed {
                            stage,
                            source: e.into(),
                        });
                    }
                    Err(e) => log!("error"; "{} also failed: {:#}", stage, e),
                }
            }
        });

        if let Some(err) = first_error {
            return Err(err);
        }
        if completed.len() < stages.len() {
            let skipped = stages
                .iter()
                .copied()
                .filter(|s| !completed.contains(s))
                .collect();
            return Err(PipelineError::Aborted { skipped });
        }
        Ok(RunSummary { completed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn never() -> bool {
        false
    }

    #[test]
    fn test_runs_in_dependency_order() {
        let graph = TaskGraph::for_mode(BuildMode::Production, true);
        let log = Mutex::new(Vec::new());
        let summary = Scheduler::with_interrupt(never)
            .run(&graph, &|stage: Stage| -> anyhow::Result<()> {
                log.lock().push(stage);
                Ok(())
            })
            .unwrap();

        let order = log.into_inner();
        assert_eq!(summary.completed.len(), 8);
        let pos = |s| order.iter().position(|&x| x == s).unwrap();
        assert_eq!(order[0], Stage::Clean);
        assert!(pos(Stage::Styles) < pos(Stage::Files));
        assert!(pos(Stage::Scripts) < pos(Stage::Files));
        assert!(pos(Stage::Revision) < pos(Stage::Rewrite));
        assert!(pos(Stage::Rewrite) < pos(Stage::Inline));
        assert_eq!(order.last(), Some(&Stage::Deploy));
    }

    #[test]
    fn test_styles_and_scripts_overlap() {
        // Both must be running at once to pass the barrier
        let graph = TaskGraph::for_mode(BuildMode::Development, false);
        let barrier = Barrier::new(2);
        let summary = Scheduler::with_interrupt(never)
            .run(&graph, &|_stage: Stage| -> anyhow::Result<()> {
                barrier.wait();
                Ok(())
            })
            .unwrap();
        assert_eq!(summary.completed.len(), 2);
    }

    #[test]
    fn test_failure_stops_dependents() {
        let graph = TaskGraph::for_mode(BuildMode::Production, true);
        let ran = Mutex::new(Vec::new());
        let err = Scheduler::with_interrupt(never)
            .run(&graph, &|stage: Stage| -> anyhow::Result<()> {
                ran.lock().push(stage);
                if stage == Stage::Revision {
                    anyhow::bail!("boom");
                }
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, PipelineError::StageFailed { stage: Stage::Revision, .. }));
        let ran = ran.into_inner();
        assert!(!ran.contains(&Stage::Rewrite));
        assert!(!ran.contains(&Stage::Inline));
        assert!(!ran.contains(&Stage::Deploy));
    }

    #[test]
    fn test_sibling_finishes_after_failure() {
        let graph = TaskGraph::for_mode(BuildMode::Production, false);
        let finished = Mutex::new(Vec::new());
        let err = Scheduler::with_interrupt(never)
            .run(&graph, &|stage: Stage| -> anyhow::Result<()> {
                match stage {
                    Stage::Styles => anyhow::bail!("sass exited with 1"),
                    Stage::Scripts => {
                        thread::sleep(Duration::from_millis(50));
                        finished.lock().push(stage);
                        Ok(())
                    }
                    _ => Ok(()),
                }
            })
            .unwrap_err();

        assert!(matches!(err, PipelineError::StageFailed { stage: Stage::Styles, .. }));
        assert_eq!(finished.into_inner(), vec![Stage::Scripts]);
    }

    #[test]
    fn test_first_error_returned() {
        let graph = TaskGraph::for_mode(BuildMode::Development, false);
        let barrier = Barrier::new(2);
        let err = Scheduler::with_interrupt(never)
            .run(&graph, &|stage: Stage| -> anyhow::Result<()> {
                barrier.wait();
                if stage == Stage::Scripts {
                    thread::sleep(Duration::from_millis(50));
                }
                anyhow::bail!("{stage} failed")
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageFailed { stage: Stage::Styles, .. }));
    }

    #[test]
    fn test_panic_is_failure() {
        let graph = TaskGraph::single(Stage::Files);
        let err = Scheduler::with_interrupt(never)
            .run(&graph, &|_stage: Stage| -> anyhow::Result<()> { panic!("copy exploded") })
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageFailed { stage: Stage::Files, .. }));
    }

    static STOP: AtomicBool = AtomicBool::new(false);

    #[test]
    fn test_interrupt_stops_launching() {
        let graph = TaskGraph::for_mode(BuildMode::Production, false);
        let err = Scheduler::with_interrupt(|| STOP.load(Ordering::SeqCst))
            .run(&graph, &|stage: Stage| -> anyhow::Result<()> {
                if stage == Stage::Clean {
                    STOP.store(true, Ordering::SeqCst);
                }
                Ok(())
            })
            .unwrap_err();
        match err {
            PipelineError::Aborted { skipped } => {
                assert!(skipped.contains(&Stage::Styles));
                assert!(!skipped.contains(&Stage::Clean));
            }
            other => panic!("expected abort, got {other}"),
        }
    }

    #[test]
    fn test_invalid_graph_rejected() {
        let mut graph = TaskGraph::single(Stage::Files);
        graph.add_edge(Stage::Files, Stage::Files);
        let result = Scheduler::with_interrupt(never).run(&graph, &|_stage: Stage| -> anyhow::Result<()> { Ok(()) });
        assert!(matches!(result, Err(PipelineError::Cycle { .. })));
    }
}
