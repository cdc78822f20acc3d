//! Dependency manifest (`requirements.txt`) parsing, merging, and rendering.

use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

mod merge;
mod parse;

pub use merge::{merge_package_sets, ManifestConflict, MergeReport, Overlap};
pub use parse::{parse_declaration, parse_manifest};

/// A single `name<op><version>` declaration. The version keeps its leading
/// operator and is empty for bare names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConstraint {
    pub name: String,
    pub version: String,
}

impl PackageConstraint {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        format!("{}{}", self.name, self.version)
    }
}

impl fmt::Display for PackageConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.version)
    }
}

/// Packages keyed by exact name, iterated in lexicographic order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageSet {
    entries: BTreeMap<String, PackageConstraint>,
}

impl PackageSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `constraint`, replacing any entry with the same name.
    pub fn insert(&mut self, constraint: PackageConstraint) -> Option<PackageConstraint> {
        self.entries.insert(constraint.name.clone(), constraint)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageConstraint> {
        self.entries.get(name)
    }

    /// Version expression for `name`, if the package is present.
    #[must_use]
    pub fn version(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.version.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageConstraint> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<PackageConstraint> for PackageSet {
    fn from_iter<I: IntoIterator<Item = PackageConstraint>>(iter: I) -> Self {
        let mut set = Self::new();
        for constraint in iter {
            set.insert(constraint);
        }
        set
    }
}

impl IntoIterator for PackageSet {
    type Item = PackageConstraint;
    type IntoIter = btree_map::IntoValues<String, PackageConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Serialize `packages` one per line in name order, each line newline-terminated.
pub fn render_manifest(packages: &PackageSet) -> String {
    let mut rendered = String::new();
    for package in packages.iter() {
        rendered.push_str(&package.name);
        rendered.push_str(&package.version);
        rendered.push('\n');
    }
    rendered
}

/// How overlapping packages are reconciled when a template manifest is merged
/// into a project manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The template's constraint always replaces the project's.
    #[default]
    PreferSource,
    /// The project's constraint is kept.
    PreferTarget,
    /// Differing constraints abort the merge.
    ErrorOnConflict,
}

impl ConflictPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictPolicy::PreferSource => "prefer-source",
            ConflictPolicy::PreferTarget => "prefer-target",
            ConflictPolicy::ErrorOnConflict => "error-on-conflict",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "prefer-source" | "source" => Ok(ConflictPolicy::PreferSource),
            "prefer-target" | "target" => Ok(ConflictPolicy::PreferTarget),
            "error-on-conflict" | "error" => Ok(ConflictPolicy::ErrorOnConflict),
            other => Err(anyhow!(
                "unknown conflict policy `{other}` \
                 (expected prefer-source, prefer-target, or error-on-conflict)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_sorts_by_name_and_joins_without_separator() {
        let packages: PackageSet = [
            PackageConstraint::new("zeta", ">=2"),
            PackageConstraint::new("alpha", ""),
            PackageConstraint::new("Mid", "~=1.4"),
        ]
        .into_iter()
        .collect();

        assert_eq!(render_manifest(&packages), "Mid~=1.4\nalpha\nzeta>=2\n");
    }

    #[test]
    fn render_of_empty_set_is_empty() {
        assert_eq!(render_manifest(&PackageSet::new()), "");
    }

    #[test]
    fn conflict_policy_parses_aliases() -> Result<()> {
        assert_eq!(
            "prefer_target".parse::<ConflictPolicy>()?,
            ConflictPolicy::PreferTarget
        );
        assert_eq!(
            "Error-On-Conflict".parse::<ConflictPolicy>()?,
            ConflictPolicy::ErrorOnConflict
        );
        assert!("newest".parse::<ConflictPolicy>().is_err());
        Ok(())
    }
}
