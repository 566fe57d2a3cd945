//! Errors raised by the revision, rewrite and inline operations.

use crate::utils::glob::{InvalidGlob, WalkError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevError {
    #[error(transparent)]
    Glob(#[from] InvalidGlob),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("failed to {action} `{}`", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build reference matcher")]
    Regex(#[from] regex::Error),

    #[error("invalid manifest `{}`", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest entry `{original}` points outside the revision base: `{revisioned}`")]
    UnsafeEntry { original: String, revisioned: String },

    #[error("unknown inline type `{kind}` in `{}`", template.display())]
    UnknownInlineType { kind: String, template: PathBuf },

    #[error("inline source `{}` not found (referenced from `{}`)", path.display(), template.display())]
    MissingInlineSource { path: PathBuf, template: PathBuf },
}

impl RevError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
