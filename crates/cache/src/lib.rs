//! Version-keyed tool cache for relup.
//!
//! Installed binaries are stored by (tool name, version), so a later job that
//! asks for the same release finds it without any network request. The layout
//! matches the hosted runner tool cache, which lets entries survive in a
//! pre-populated `RUNNER_TOOL_CACHE`.

mod store;

pub use store::{TOOL_CACHE_ENV, ToolCache, clean_version, default_cache_dir};
