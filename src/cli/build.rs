//! Pipeline orchestration for the `build`, `run` and `deploy` commands.
//!
//! Full runs are wrapped in hooks:
//! - **Pre Hooks** - user commands before the first stage
//! - **Stages** - the task graph, run by the scheduler
//! - **Post Hooks** - user commands once every stage succeeded

use crate::config::PipelineConfig;
use crate::hooks;
use crate::logger::{StageClock, plural_count};
use crate::pipeline::{RunSummary, Scheduler, Stage, TaskGraph};
use crate::stage::StageTasks;
use anyhow::{Result, bail};

/// Run the full graph for the configured mode.
pub fn build(config: &PipelineConfig) -> Result<RunSummary> {
    let graph = TaskGraph::for_mode(config.mode, false);
    run_with_hooks(config, &graph)
}

/// Build in production mode, then deploy. With `skip_build`, deploy the
/// existing build directory as is.
pub fn deploy(config: &PipelineConfig, skip_build: bool) -> Result<RunSummary> {
    if config.mode.is_dev() {
        bail!("deploy needs a production build; unset --dev and NODE_ENV=development");
    }
    if skip_build {
        return run_stage(config, Stage::Deploy);
    }
    let graph = TaskGraph::for_mode(config.mode, true);
    run_with_hooks(config, &graph)
}

/// Run one stage against the current build directory. Hooks are skipped.
pub fn run_stage(config: &PipelineConfig, stage: Stage) -> Result<RunSummary> {
    let summary = Scheduler::new().run(&TaskGraph::single(stage), &StageTasks::new(config))?;
    Ok(summary)
}

fn run_with_hooks(config: &PipelineConfig, graph: &TaskGraph) -> Result<RunSummary> {
    let clock = StageClock::start("pipeline");
    crate::log!("pipeline"; "{} build of {}", config.mode, plural_count(graph.stages().len(), "stage"));

    hooks::run_pre_hooks(config)?;
    let summary = Scheduler::new().run(graph, &StageTasks::new(config))?;
    hooks::run_post_hooks(config)?;

    clock.finish();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::core::BuildMode;
    use crate::rev::Manifest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(base: &Path, rel: &str, content: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_deploy_refuses_development() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config_at(dir.path(), "");
        config.mode = BuildMode::Development;
        assert!(deploy(&config, true).is_err());
    }

    /// Production graph end to end, with `cp` standing in for the compilers.
    #[cfg(unix)]
    #[test]
    fn test_production_build() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "sass/screen.scss", "body {\n  color: red;\n}\n");
        write(root, "sass/extra.scss", "h1 { color: blue; }\n");
        write(root, "js/main.js", "console.log( 'hi' );\n");
        write(root, "craft", "#!/usr/bin/env php\n");
        write(root, "web/index.php", "<?php\n");
        write(
            root,
            "templates/_layout.html",
            "<!-- process:css inline extra.css --><link href=\"/styles/extra.css\"><!-- /process -->\n\
             <link href=\"/styles/screen.css\">\n<script src=\"/js/main.js\"></script>\n",
        );
        // Stale output from an earlier build
        write(root, "dist/old.txt", "stale");

        let config = test_config_at(
            root,
            r#"
[styles]
entries = ["sass/screen.scss", "sass/extra.scss"]
command = ["sh", "-c", "cp \"$0\" \"$1\"", "$INPUT", "$OUTPUT"]
build_args = []

[scripts]
command = ["sh", "-c", "cp \"$0\" \"$1\"", "$INPUT", "$OUTPUT"]
"#,
        );

        let summary = build(&config).unwrap();
        assert_eq!(summary.completed.len(), 7);
        assert_eq!(summary.completed.last(), Some(&Stage::Inline));

        let dist = root.join("dist");
        assert!(!dist.join("old.txt").exists());
        assert!(dist.join("craft").is_file());
        assert!(dist.join("web/index.php").is_file());

        let manifest = Manifest::load(&root.join("rev-manifest.json")).unwrap();
        let main = manifest.get("js/main.js").unwrap();
        assert!(dist.join("web").join(main).is_file());
        assert!(manifest.get("styles/screen.css").is_none());

        let layout = fs::read_to_string(dist.join("templates/_layout.html")).unwrap();
        assert!(layout.starts_with("<style>h1{color:#00f}</style>"));
        assert!(layout.contains(&format!("/{main}")));
        assert!(layout.contains("/styles/screen.css"));

        // Source tree untouched
        assert!(fs::read_to_string(root.join("templates/_layout.html"))
            .unwrap()
            .contains("process:css"));
    }
}
