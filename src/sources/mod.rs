//! Module sources.
//!
//! The resolver reads installed modules through the [`ModuleFs`] trait so
//! the same traversal runs against disk or an in-memory tree.

pub mod disk;
pub mod source;

pub use disk::DiskFs;
pub use source::ModuleFs;
