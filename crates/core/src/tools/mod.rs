//! Types shared by the install pipeline and its collaborators.
//!
//! # Architecture
//!
//! - [`HostPlatform`], [`ArchPolicy`], [`PlatformSignature`] - what the host
//!   is and how its architecture may be spelled in asset names
//! - [`ReleaseDescriptor`], [`AssetDescriptor`] - a resolved release
//! - [`ReleaseHost`] - release-hosting service (GitHub Releases, test stubs)
//! - [`InstallCache`] - version-keyed store of installed binaries
//! - [`ArchiveKind`] - packaging format of an asset

mod archive;
mod cache;
mod platform;
mod release;

pub use archive::{ArchiveKind, normalize_suffix};
pub use cache::InstallCache;
pub use platform::{ArchPattern, ArchPolicy, HostPlatform, PlatformSignature};
pub use release::{AssetDescriptor, ReleaseDescriptor, ReleaseHost};
