//! Environment snapshot.
//!
//! The process environment and the project's `.env` file are read exactly
//! once, into an [`Environment`]. Overrides are then applied from that map,
//! so nothing downstream ever consults `std::env`.

use super::ConfigError;
use rustc_hash::FxHashMap;
use std::ffi::OsString;
use std::path::Path;

/// Variables consulted when applying overrides.
pub const BUILD_DIR: &str = "BUILD_DIR";
pub const CSS_DIR: &str = "CSS_DIR";
pub const JS_DIR: &str = "JS_DIR";
pub const JS_ENTRY: &str = "JS_ENTRY";
pub const TEMPLATES_DIR: &str = "TEMPLATES_DIR";
pub const SOURCE_ROOT: &str = "SOURCE_ROOT";
pub const CMS_MODE: &str = "CMS_MODE";
pub const NODE_ENV: &str = "NODE_ENV";

/// Immutable view of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: FxHashMap<String, String>,
}

impl Environment {
    /// Read `<root>/.env` (if present), then overlay the process environment.
    ///
    /// Process variables win over `.env` entries.
    pub fn capture(root: &Path) -> Result<Self, ConfigError> {
        let mut vars = FxHashMap::default();

        let dotenv = root.join(".env");
        if dotenv.is_file() {
            let iter = dotenvy::from_path_iter(&dotenv)
                .map_err(|e| ConfigError::Dotenv(dotenv.clone(), e))?;
            for item in iter {
                let (key, value) = item.map_err(|e| ConfigError::Dotenv(dotenv.clone(), e))?;
                vars.insert(key, value);
            }
        }

        vars.extend(utf8_pairs(std::env::vars_os()));
        Ok(Self { vars })
    }

    /// Build a snapshot from explicit pairs.
    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name`. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Skip variables whose name or value is not valid UTF-8.
fn utf8_pairs(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}
