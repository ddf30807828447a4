//! High-level operations.
//!
//! This module contains the implementation of wsbundle commands.

pub mod archive;
pub mod package;
pub mod resolve;

pub use archive::{write_archive, ArchiveFormat, ArchiveInfo};
pub use package::{
    package, plan_copies, CopyPlan, Layout, PackageError, PackageOptions, PackageResult,
    PlannedCopy,
};
pub use resolve::{resolve_member, resolve_package, PackageResolution, ResolvePackageOptions};
