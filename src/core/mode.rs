//! Build mode for production/development builds.

use std::fmt;

/// Build mode.
///
/// Production writes compiled assets into the build directory and runs the
/// full revision pipeline. Development writes compiled assets straight into
/// the source `web/` tree with source maps and skips everything after the
/// compile stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    #[default]
    Production,
    Development,
}

impl BuildMode {
    /// Derive the mode from a `NODE_ENV`-style value.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("development") => Self::Development,
            _ => Self::Production,
        }
    }

    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
