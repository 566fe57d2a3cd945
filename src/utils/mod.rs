//! Utility modules shared by the stages.

pub mod exec;
pub mod git;
pub mod glob;
pub mod hash;
pub mod minify;
pub mod path;
