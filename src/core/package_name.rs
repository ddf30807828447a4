//! Package names - scope-aware and safe to join onto a modules directory.
//!
//! A name is either bare (`left-pad`) or scoped (`@scope/util`). Scoped
//! names are installed one directory deeper (`node_modules/@scope/util`),
//! and their leading `@` must never be mistaken for a version separator.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted package names. Uppercase letters are allowed because older
/// registry packages still use them.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[A-Za-z0-9\-*~][A-Za-z0-9\-*._~]*/)?[A-Za-z0-9\-~][A-Za-z0-9\-._~]*$")
        .expect("package name pattern is valid")
});

/// Maximum length of a package name.
pub const MAX_NAME_LENGTH: usize = 214;

/// Error returned for names that cannot be installed into a modules directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageNameError {
    #[error("package name is empty")]
    Empty,

    #[error("package name `{0}` is longer than {MAX_NAME_LENGTH} characters")]
    TooLong(String),

    #[error("package name `{0}` contains characters that are not allowed")]
    InvalidCharacters(String),

    #[error("scoped package name `{0}` must have the form `@scope/name`")]
    MalformedScope(String),
}

/// A validated package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName {
    full: String,
    /// Byte offset of the `/` in scoped names.
    scope_end: Option<usize>,
}

impl PackageName {
    /// Parse and validate a package name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, PackageNameError> {
        let name = name.as_ref();

        if name.is_empty() {
            return Err(PackageNameError::Empty);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(PackageNameError::TooLong(name.to_string()));
        }

        let scope_end = if name.starts_with('@') {
            match name.find('/') {
                Some(idx) if idx > 1 && idx + 1 < name.len() => Some(idx),
                _ => return Err(PackageNameError::MalformedScope(name.to_string())),
            }
        } else {
            None
        };

        if !NAME_PATTERN.is_match(name) {
            return Err(PackageNameError::InvalidCharacters(name.to_string()));
        }

        // `.` and `..` would escape the modules directory.
        let base = &name[scope_end.map(|i| i + 1).unwrap_or(0)..];
        if base.starts_with('.') {
            return Err(PackageNameError::InvalidCharacters(name.to_string()));
        }

        Ok(PackageName {
            full: name.to_string(),
            scope_end,
        })
    }

    /// The full name, including the scope.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The scope including its `@` marker, if any.
    pub fn scope(&self) -> Option<&str> {
        self.scope_end.map(|end| &self.full[..end])
    }

    /// The name without its scope.
    pub fn base_name(&self) -> &str {
        match self.scope_end {
            Some(end) => &self.full[end + 1..],
            None => &self.full,
        }
    }

    /// Whether this is a scoped name.
    pub fn is_scoped(&self) -> bool {
        self.scope_end.is_some()
    }

    /// Relative path of this package inside a modules directory.
    pub fn relative_path(&self) -> PathBuf {
        match self.scope() {
            Some(scope) => Path::new(scope).join(self.base_name()),
            None => PathBuf::from(&self.full),
        }
    }

    /// Name usable as a single file name (`@scope/util` becomes `scope-util`).
    pub fn sanitized(&self) -> String {
        self.full.trim_start_matches('@').replace('/', "-")
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageName::new(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = PackageNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PackageName::new(value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.full
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}
