//! Resolution warnings and diagnostics.
//!
//! Nothing found mid-traversal is fatal: each problem is recorded as a
//! warning and resolution carries on with whatever it could find.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{Diagnostic, INSTALL_HELP};

/// A non-fatal problem found during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveWarning {
    #[error("could not find `{name}` in any search directory")]
    Unresolved {
        name: String,
        required_by: Vec<String>,
        /// Every requirer declared it as optional
        optional: bool,
    },

    #[error("could not read manifest at {}", path.display())]
    UnreadableManifest { path: PathBuf, message: String },

    #[error("`{name}` is not a valid package name")]
    InvalidName {
        name: String,
        required_by: String,
        message: String,
    },
}

impl ResolveWarning {
    /// The dependency name this warning is about, if any.
    pub fn dependency_name(&self) -> Option<&str> {
        match self {
            ResolveWarning::Unresolved { name, .. } | ResolveWarning::InvalidName { name, .. } => {
                Some(name)
            }
            ResolveWarning::UnreadableManifest { .. } => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveWarning::Unresolved {
                name,
                required_by,
                optional,
            } => Diagnostic::warning(format!(
                "dependency `{}` is not installed and was left out of the bundle",
                name
            ))
            .required_by(required_by.iter().cloned())
            .optional(*optional)
            .with_help(INSTALL_HELP),

            ResolveWarning::UnreadableManifest { path, message } => {
                Diagnostic::warning("could not read an installed module's manifest")
                    .with_location(path)
                    .with_note(message.clone())
                    .with_note("its own dependencies were not followed")
                    .with_help(INSTALL_HELP)
            }

            ResolveWarning::InvalidName {
                name,
                required_by,
                message,
            } => Diagnostic::warning(format!("skipping dependency `{}`", name))
                .required_by([required_by.as_str()])
                .with_note(message.clone()),
        }
    }
}
