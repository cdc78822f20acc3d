use tracing::trace;

use super::{PackageConstraint, PackageSet};

/// Parse manifest text into a [`PackageSet`].
///
/// Blank lines, `#` comments, and option lines (`-r`, `--index-url`, ...)
/// are skipped. Parsing never fails: a line that does not split into a name
/// and a constraint is kept whole as a bare package name.
pub fn parse_manifest(content: &str) -> PackageSet {
    let mut packages = PackageSet::new();
    for line in content.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
            continue;
        }
        packages.insert(parse_declaration(trimmed));
    }
    packages
}

/// Split a single trimmed declaration into name and version expression.
pub fn parse_declaration(line: &str) -> PackageConstraint {
    let mut end = line.len();
    for (idx, ch) in line.char_indices() {
        if !is_name_char(ch) {
            end = idx;
            break;
        }
    }
    let (name, rest) = line.split_at(end);
    if !name.is_empty() && rest.starts_with(is_operator_char) {
        PackageConstraint::new(name, rest)
    } else {
        trace!(line, "no version constraint, keeping whole line as name");
        PackageConstraint::new(line, "")
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, '<' | '>' | '=' | '~' | '!')
}
