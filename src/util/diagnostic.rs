//! Terminal diagnostics for resolution warnings and command errors.

use std::fmt;
use std::path::PathBuf;

/// Help shown when installed modules are missing or broken.
pub const INSTALL_HELP: &str = "Run `yarn install` (or `npm install`) at the workspace root";

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The command failed
    Error,
    /// The bundle was produced but may be incomplete
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> String {
        let (name, style) = match self {
            Severity::Error => ("error", "1;31"),
            Severity::Warning => ("warning", "1;33"),
        };
        if color {
            format!("\x1b[{}m{}\x1b[0m", style, name)
        } else {
            name.to_string()
        }
    }
}

/// A problem report. Resolution warnings carry the packages whose manifests
/// led to the problem.
///
/// ```text
/// warning: dependency `chalk` is not installed and was left out of the bundle
///   = required by lib, logger@1.0.0 (as an optional dependency)
///   = help: Run `yarn install` (or `npm install`) at the workspace root
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// File or module directory the problem was found at
    pub location: Option<PathBuf>,
    /// Packages whose manifests declared the dependency, in discovery order
    pub required_by: Vec<String>,
    /// Every requirer declared the dependency as optional
    pub optional: bool,
    /// Underlying causes, outermost first
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            location: None,
            required_by: Vec::new(),
            optional: false,
            notes: Vec::new(),
            help: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Record the packages that led here.
    pub fn required_by<I, S>(mut self, requirers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_by.extend(requirers.into_iter().map(Into::into));
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Set the help line. A later call replaces an earlier one.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render for the terminal.
    pub fn format(&self, color: bool) -> String {
        let mut out = format!("{}: {}\n", self.severity.label(color), self.message);

        if let Some(path) = &self.location {
            out.push_str(&format!("  --> {}\n", path.display()));
        }
        if !self.required_by.is_empty() {
            out.push_str(&format!("  = required by {}", self.required_by.join(", ")));
            if self.optional {
                out.push_str(" (as an optional dependency)");
            }
            out.push('\n');
        }
        for note in &self.notes {
            out.push_str(&format!("  = {}\n", note));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("  = help: {}\n", help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_with_requirers() {
        let diag = Diagnostic::warning("dependency `fsevents` is not installed")
            .required_by(["chokidar@3.5.3", "lib"])
            .optional(true)
            .with_help(INSTALL_HELP);

        assert_eq!(
            diag.to_string(),
            "warning: dependency `fsevents` is not installed\n\
             \x20 = required by chokidar@3.5.3, lib (as an optional dependency)\n\
             \x20 = help: Run `yarn install` (or `npm install`) at the workspace root\n"
        );
    }

    #[test]
    fn test_error_with_location_and_notes() {
        let output = Diagnostic::error("build script of `api` failed")
            .with_location("/ws/packages/api")
            .with_note("`yarn run build` exited with status 1")
            .with_help("fix the build")
            .with_help("skip it with `--no-build`")
            .format(false);

        assert!(output.starts_with("error: build script of `api` failed\n  --> /ws/packages/api\n"));
        assert!(output.contains("  = `yarn run build` exited"));
        assert!(!output.contains("required by"));
        assert!(!output.contains("fix the build"));
        assert!(output.ends_with("  = help: skip it with `--no-build`\n"));
    }

    #[test]
    fn test_colored_severity() {
        let output = Diagnostic::warning("something").format(true);
        assert!(output.starts_with("\x1b[1;33mwarning\x1b[0m: something"));
    }
}
