//! Revision-and-rewrite stage.
//!
//! Runs strictly in this order over the build directory:
//!
//! 1. [`assign_revisions`]: content-hash asset names, produce a [`Manifest`]
//! 2. [`rewrite_references`]: point template references at revisioned names
//! 3. [`inline_assets`]: splice critical assets into templates
//!
//! The source tree is never touched.

mod error;
pub mod inline;
mod manifest;
pub mod revision;
pub mod rewrite;

#[cfg(test)]
mod tests;

pub use error::RevError;
pub use inline::inline_assets;
pub use manifest::{Manifest, Revision};
pub use revision::{assign_revisions, carry_over, prune_stale};
pub use rewrite::{RewriteReport, rewrite_references};
