use std::path::Path;

use anyhow::{anyhow, bail, Result};
use stencil_domain::{
    merge_package_sets, parse_manifest, render_manifest, ConflictPolicy, MergeReport,
};
use tracing::{debug, info, warn};

use crate::effects::FileSystem;

/// Merge the template manifest `source` into the project manifest `target`
/// and write the result to `output_dir/<target file name>`.
///
/// # Errors
/// Fails when either manifest is missing, cannot be read, the policy rejects
/// a conflict, or the merged file cannot be written.
pub fn merge_manifest_files(
    fs: &dyn FileSystem,
    source: &Path,
    target: &Path,
    output_dir: &Path,
    policy: ConflictPolicy,
) -> Result<MergeReport> {
    if !fs.exists(source) || !fs.exists(target) {
        bail!("cannot merge manifests: source or target does not exist");
    }
    let file_name = target
        .file_name()
        .ok_or_else(|| anyhow!("manifest path {} has no file name", target.display()))?;

    let source_packages = parse_manifest(&fs.read_to_string(source)?);
    let target_packages = parse_manifest(&fs.read_to_string(target)?);
    debug!(
        source = %source.display(),
        target = %target.display(),
        template_packages = source_packages.len(),
        project_packages = target_packages.len(),
        %policy,
        "merging manifests"
    );

    let report = merge_package_sets(&source_packages, target_packages, policy)?;
    let output = output_dir.join(file_name);
    fs.write(&output, render_manifest(&report.merged).as_bytes())?;
    Ok(report)
}

/// Boolean form of [`merge_manifest_files`]: failures are logged, never raised.
pub fn merge_manifests(
    fs: &dyn FileSystem,
    source: &Path,
    target: &Path,
    output_dir: &Path,
    policy: ConflictPolicy,
) -> bool {
    match merge_manifest_files(fs, source, target, output_dir, policy) {
        Ok(report) => {
            for overlap in &report.overlaps {
                info!(
                    package = %overlap.name,
                    project = %overlap.target_version,
                    template = %overlap.source_version,
                    kept = %overlap.resolved_version,
                    "package already declared by the project"
                );
            }
            info!(packages = report.merged.len(), "merged manifests");
            true
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "error merging manifests");
            false
        }
    }
}

/// Structural check only: true when the file reads and parses.
pub fn verify_manifest(fs: &dyn FileSystem, path: &Path) -> bool {
    match fs.read_to_string(path) {
        Ok(contents) => {
            let packages = parse_manifest(&contents);
            debug!(path = %path.display(), packages = packages.len(), "manifest verified");
            true
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "error verifying manifest");
            false
        }
    }
}
