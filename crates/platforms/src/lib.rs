//! Supported chat platforms.
//!
//! A closed table: one [`PlatformDescriptor`] row per [`PlatformId`].
//! Adding a platform means adding a variant and a row, never new control flow.

pub mod host;
pub mod registry;

pub use host::hostname_of;
pub use registry::{PLATFORMS, PlatformDescriptor, PlatformId, all, descriptor, detect_platform};
