//! Git operations for the deploy transport.
//!
//! The build directory is its own repository: the whole tree is committed
//! onto the deploy branch with gix, and pushing is left to the `git` binary
//! so credential helpers and ssh agents keep working.

mod repo;
mod tree;

pub use repo::{commit_all, open_or_init};
