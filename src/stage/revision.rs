//! Glue between the configuration and the revision-and-rewrite operations.

use crate::config::PipelineConfig;
use crate::logger::plural_count;
use crate::rev::{self, Manifest};
use crate::utils::path::display_rel;
use anyhow::{Context, Result};

/// Revision assets under the revision base and write the manifest.
///
/// Entries from the previous manifest whose files still exist are kept, and
/// revisions they no longer name are deleted.
pub fn revision(config: &PipelineConfig) -> Result<()> {
    let base = config.rev_base();
    let manifest_path = config.manifest_path();

    let previous = if manifest_path.is_file() {
        Manifest::load(manifest_path)?
    } else {
        Manifest::new()
    };

    let mut manifest = rev::assign_revisions(&base, &config.rev.patterns)
        .with_context(|| format!("failed to revision assets in {}", base.display()))?;
    let fresh = manifest.len();
    let kept = rev::carry_over(&base, &previous, &mut manifest);

    manifest.save(manifest_path)?;
    let pruned = rev::prune_stale(&base, &previous, &manifest)?;

    crate::log!(
        "revision";
        "{} revisioned, {} kept, {} pruned -> {}",
        plural_count(fresh, "asset"),
        kept,
        pruned,
        display_rel(manifest_path, config.root())
    );
    Ok(())
}

/// Rewrite template references from the manifest.
pub fn rewrite(config: &PipelineConfig) -> Result<()> {
    let templates_dir = config.templates_dir();
    let report = rev::rewrite_references(config.manifest_path(), &templates_dir, &config.rev.templates)
        .with_context(|| format!("failed to rewrite templates in {}", templates_dir.display()))?;

    crate::log!(
        "rewrite";
        "{} in {} of {}",
        plural_count(report.replacements, "reference"),
        report.files_changed,
        plural_count(report.files_scanned, "template")
    );
    Ok(())
}

/// Inline marked assets into templates.
pub fn inline(config: &PipelineConfig) -> Result<()> {
    let templates_dir = config.templates_dir();
    let report = rev::inline_assets(
        &templates_dir,
        config.inline_templates(),
        &config.inline_base(),
        &config.inline.marker,
    )?;

    crate::log!(
        "inline";
        "{} in {} of {}",
        plural_count(report.blocks, "block"),
        report.files_changed,
        plural_count(report.files_scanned, "template")
    );
    Ok(())
}
