//! Pipeline stages.

use std::fmt;

/// One node of the task graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Stage {
    /// Empty the build directory (keeps `.git*`).
    Clean,
    /// Compile stylesheet entries.
    Styles,
    /// Bundle the script entry.
    Scripts,
    /// Copy the deployable file set.
    Files,
    /// Content-hash asset names, write the manifest.
    Revision,
    /// Point template references at revisioned names.
    Rewrite,
    /// Splice critical assets into templates.
    Inline,
    /// Hand the build directory to the deploy transport.
    Deploy,
}

impl Stage {
    #[cfg(test)]
    pub const ALL: [Stage; 8] = [
        Stage::Clean,
        Stage::Styles,
        Stage::Scripts,
        Stage::Files,
        Stage::Revision,
        Stage::Rewrite,
        Stage::Inline,
        Stage::Deploy,
    ];

    /// Lowercase name, also used as the log prefix.
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Styles => "styles",
            Stage::Scripts => "scripts",
            Stage::Files => "files",
            Stage::Revision => "revision",
            Stage::Rewrite => "rewrite",
            Stage::Inline => "inline",
            Stage::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
