//! Specifier formatting.
//!
//! A specifier is the identity of a resolved dependency: the bare name, or
//! `name@version` when several versions of that name are bundled together.
//! Scoped names start with `@`, so parsing only ever splits on the last
//! `@` and never on the scope marker.

/// Separator between a name and its version.
pub const VERSION_SEPARATOR: char = '@';

/// Render a dependency as a specifier.
///
/// The version is appended only when `needs_disambiguation` is set and a
/// non-empty version is known. Characters in the version that could be
/// mistaken for separators or path components are replaced with `-`.
pub fn format_specifier(name: &str, version: Option<&str>, needs_disambiguation: bool) -> String {
    let version = version.map(str::trim).filter(|v| !v.is_empty());

    match version {
        Some(version) if needs_disambiguation => {
            let version: String = version
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_') {
                        c
                    } else {
                        '-'
                    }
                })
                .collect();
            format!("{}{}{}", name, VERSION_SEPARATOR, version)
        }
        _ => name.to_string(),
    }
}

/// Split a specifier back into its name and optional version.
///
/// `@scope/util` has no version: its only `@` is the scope marker.
pub fn parse_specifier(specifier: &str) -> (&str, Option<&str>) {
    match specifier.rfind(VERSION_SEPARATOR) {
        Some(idx) if idx > 0 => {
            let (name, version) = (&specifier[..idx], &specifier[idx + 1..]);
            let scope_only = name.starts_with(VERSION_SEPARATOR) && !name.contains('/');
            if scope_only || version.is_empty() {
                (specifier, None)
            } else {
                (name, Some(version))
            }
        }
        _ => (specifier, None),
    }
}
