//! Stage implementations.
//!
//! [`StageTasks`] binds the configuration to the scheduler: each [`Stage`]
//! maps to one function here. Compile and deploy stages only glue external
//! tools together; the revision stages call into [`crate::rev`].

mod clean;
mod compile;
mod deploy;
mod files;
mod revision;

pub use clean::clean_build_dir;
pub use compile::{bundle_scripts, compile_styles};
pub use deploy::deploy;
pub use files::copy_files;
pub use revision::{inline, revision, rewrite};

use crate::config::PipelineConfig;
use crate::logger::StageClock;
use crate::pipeline::{Stage, StageRunner};

/// Runs stages against one configuration.
pub struct StageTasks<'a> {
    config: &'a PipelineConfig,
}

impl<'a> StageTasks<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Whether the stage does anything under the current configuration.
    pub fn enabled(&self, stage: Stage) -> bool {
        let config = self.config;
        match stage {
            Stage::Clean => config.build.clean,
            Stage::Styles => config.styles.enable,
            Stage::Scripts => config.scripts.enable,
            Stage::Revision | Stage::Rewrite => config.rev.enable,
            Stage::Inline => config.inline.enable,
            Stage::Files | Stage::Deploy => true,
        }
    }
}

impl StageRunner for StageTasks<'_> {
    fn run(&self, stage: Stage) -> anyhow::Result<()> {
        if !self.enabled(stage) {
            crate::debug!(stage.name(); "disabled, skipping");
            return Ok(());
        }

        let clock = StageClock::start(stage.name());
        let config = self.config;
        match stage {
            Stage::Clean => {
                clean_build_dir(config.build_dir())?;
            }
            Stage::Styles => compile_styles(config)?,
            Stage::Scripts => bundle_scripts(config)?,
            Stage::Files => {
                copy_files(config)?;
            }
            Stage::Revision => revision(config)?,
            Stage::Rewrite => rewrite(config)?,
            Stage::Inline => inline(config)?,
            Stage::Deploy => deploy(config)?,
        }
        clock.finish();
        Ok(())
    }
}
