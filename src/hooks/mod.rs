//! User-defined commands around the stage graph.
//!
//! `[[hooks.pre]]` run before the first stage, `[[hooks.post]]` after the
//! last stage succeeded.

mod runner;

pub use runner::*;
