use serde::{Deserialize, Serialize};

use super::{ConflictPolicy, PackageConstraint, PackageSet};

/// A package declared by both manifests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlap {
    pub name: String,
    pub source_version: String,
    pub target_version: String,
    pub resolved_version: String,
}

impl Overlap {
    #[must_use]
    pub fn differs(&self) -> bool {
        self.source_version != self.target_version
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MergeReport {
    pub policy: ConflictPolicy,
    pub merged: PackageSet,
    /// Template packages the project did not declare.
    pub added: Vec<String>,
    pub overlaps: Vec<Overlap>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "conflicting constraints for `{name}`: template declares `{source_version}`, \
     project declares `{target_version}`"
)]
pub struct ManifestConflict {
    pub name: String,
    pub source_version: String,
    pub target_version: String,
}

/// Fold `source` (the template) into `target` (the project) under `policy`.
///
/// Every template package missing from the project is added. Overlapping
/// packages are resolved by the policy; `PreferSource` replaces the project's
/// constraint even when both sides already agree.
pub fn merge_package_sets(
    source: &PackageSet,
    target: PackageSet,
    policy: ConflictPolicy,
) -> Result<MergeReport, ManifestConflict> {
    let mut merged = target;
    let mut added = Vec::new();
    let mut overlaps = Vec::new();

    for package in source.iter() {
        let Some(existing) = merged.get(&package.name).cloned() else {
            added.push(package.name.clone());
            merged.insert(package.clone());
            continue;
        };

        let resolved = match policy {
            ConflictPolicy::PreferSource => package.version.clone(),
            ConflictPolicy::PreferTarget => existing.version.clone(),
            ConflictPolicy::ErrorOnConflict => {
                if existing.version != package.version {
                    return Err(ManifestConflict {
                        name: package.name.clone(),
                        source_version: package.version.clone(),
                        target_version: existing.version,
                    });
                }
                existing.version.clone()
            }
        };
        tracing::debug!(
            package = %package.name,
            template = %package.version,
            project = %existing.version,
            resolved = %resolved,
            "manifest_overlap"
        );
        merged.insert(PackageConstraint::new(package.name.clone(), resolved.clone()));
        overlaps.push(Overlap {
            name: package.name.clone(),
            source_version: package.version.clone(),
            target_version: existing.version,
            resolved_version: resolved,
        });
    }

    Ok(MergeReport {
        policy,
        merged,
        added,
        overlaps,
    })
}
