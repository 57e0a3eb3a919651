//! relup: install a tool binary from a GitHub release.
//!
//! The binary runs as a GitHub Actions step or as a plain CLI. It resolves
//! the requested release, picks the one asset built for the host, unpacks
//! it, stores the binary in the runner tool cache and publishes its
//! directory through `GITHUB_PATH`.

pub mod cli;
pub mod commands;
pub mod tracing;
pub mod workflow;

pub use cli::{Cli, EXIT_FAILED, EXIT_OK};
pub use workflow::Workflow;
