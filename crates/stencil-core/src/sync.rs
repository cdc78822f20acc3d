use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::json;
use stencil_domain::{ConflictPolicy, MergeReport};
use tracing::{debug, warn};

use crate::config::SyncSettings;
use crate::effects::{Effects, FileSystem};
use crate::manifest::{merge_manifest_files, verify_manifest};
use crate::outcome::ExecutionOutcome;

#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Directory whose entries are copied (the scaffold template).
    pub template_root: PathBuf,
    pub target: PathBuf,
    pub settings: SyncSettings,
    /// Paths inside the template that are never copied, such as the running
    /// executable.
    pub skip_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryError {
    pub entry: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Files written, relative to the target.
    pub copied_files: Vec<String>,
    /// Top-level directories copied wholesale.
    pub copied_dirs: Vec<String>,
    /// Top-level directories that already existed and received missing files.
    pub merged_dirs: Vec<String>,
    /// Top-level files replaced by the template's copy.
    pub overwritten: Vec<String>,
    pub manifest_merge: Option<MergeReport>,
    pub errors: Vec<EntryError>,
    pub missing_essentials: Vec<String>,
    /// Human-readable log of every action, in order.
    pub notes: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty() && self.missing_essentials.is_empty()
    }

    fn note(&mut self, message: String) {
        debug!("{message}");
        self.notes.push(message);
    }

    fn error(&mut self, entry: &str, message: String) {
        warn!(entry, "{message}");
        self.notes.push(message.clone());
        self.errors.push(EntryError {
            entry: entry.to_string(),
            message,
        });
    }
}

/// Make sure `target` exists as a directory. Returns `true` when it had to be
/// created.
///
/// # Errors
/// Fails when `target` is an existing non-directory or cannot be created.
pub fn prepare_target(fs: &dyn FileSystem, target: &Path) -> Result<bool> {
    if fs.exists(target) {
        if !fs.is_dir(target) {
            bail!("{} exists and is not a directory", target.display());
        }
        return Ok(false);
    }
    fs.create_dir_all(target)?;
    Ok(true)
}

/// Copy the template's top-level entries into the target.
///
/// Existing directories are merged without overwriting any file, other files
/// are overwritten, and the dependency manifest is merged when both sides
/// already have one. Per-entry failures are recorded and the walk continues.
pub fn synchronize(fs: &dyn FileSystem, request: &SyncRequest) -> SyncReport {
    let mut report = SyncReport::default();
    let manifest_name = request.settings.manifest_name.as_str();
    let source_manifest = request.template_root.join(manifest_name);
    let target_manifest = request.target.join(manifest_name);
    let merge_manifest = is_regular_file(fs, &source_manifest)
        && is_regular_file(fs, &target_manifest);
    let skip = canonical_skip_list(fs, &request.skip_paths);

    match fs.list_dir(&request.template_root) {
        Ok(entries) => {
            for source_path in entries {
                let Some(name) = source_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                else {
                    continue;
                };
                if request.settings.exclude.iter().any(|item| *item == name)
                    || is_skipped(fs, &source_path, &skip)
                {
                    debug!(entry = %name, "skipping template entry");
                    continue;
                }

                let result = if merge_manifest && name == manifest_name {
                    merge_manifest_entry(
                        fs,
                        &source_manifest,
                        &target_manifest,
                        &request.target,
                        request.settings.conflict_policy,
                        &mut report,
                    );
                    Ok(())
                } else {
                    sync_entry(fs, &source_path, &name, &request.target, &mut report)
                };
                if let Err(err) = result {
                    report.error(&name, format!("Error copying {name}: {err:#}"));
                }
            }
        }
        Err(err) => {
            report.error(
                ".",
                format!(
                    "Error reading template root {}: {err:#}",
                    request.template_root.display()
                ),
            );
        }
    }

    report.missing_essentials = request
        .settings
        .essential_paths
        .iter()
        .filter(|item| !fs.exists(&request.target.join(item.as_str())))
        .cloned()
        .collect();
    report
}

fn sync_entry(
    fs: &dyn FileSystem,
    source_path: &Path,
    name: &str,
    target: &Path,
    report: &mut SyncReport,
) -> Result<()> {
    let target_path = target.join(name);
    if fs.is_dir(source_path) {
        if fs.exists(&target_path) {
            merge_directory(fs, source_path, &target_path, name, report)?;
        } else {
            fs.copy_tree(source_path, &target_path)?;
            report.copied_dirs.push(name.to_string());
            report.note(format!("Copied directory {name} to {}", target.display()));
        }
        return Ok(());
    }

    let existed = fs.exists(&target_path);
    if existed {
        report.note(format!("File {name} already exists in target, overwriting..."));
    }
    fs.copy(source_path, &target_path)?;
    if existed {
        report.overwritten.push(name.to_string());
    }
    report.copied_files.push(name.to_string());
    report.note(format!("Copied file {name} to {}", target.display()));
    Ok(())
}

/// Mirror `source_dir` into the existing `target_dir`, copying only files the
/// target does not have yet.
fn merge_directory(
    fs: &dyn FileSystem,
    source_dir: &Path,
    target_dir: &Path,
    name: &str,
    report: &mut SyncReport,
) -> Result<()> {
    report.merged_dirs.push(name.to_string());
    report.note(format!(
        "Directory {name} already exists in target, merging contents..."
    ));
    for entry in fs.walk(source_dir)? {
        let dest = target_dir.join(&entry.relative);
        if entry.is_dir {
            fs.create_dir_all(&dest)?;
            continue;
        }
        if fs.exists(&dest) {
            debug!(path = %dest.display(), "keeping existing file");
            continue;
        }
        fs.copy(&entry.path, &dest)?;
        let rel = Path::new(name).join(&entry.relative).display().to_string();
        report.note(format!("Copied {rel} to {rel}"));
        report.copied_files.push(rel);
    }
    Ok(())
}

fn merge_manifest_entry(
    fs: &dyn FileSystem,
    source: &Path,
    target: &Path,
    output_dir: &Path,
    policy: ConflictPolicy,
    report: &mut SyncReport,
) {
    let manifest = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match merge_manifest_files(fs, source, target, output_dir, policy) {
        Ok(merge) => {
            for overlap in &merge.overlaps {
                report.note(format!(
                    "Package {} already exists in target {manifest} with version {}",
                    overlap.name,
                    display_version(&overlap.target_version)
                ));
                let kept = match policy {
                    ConflictPolicy::PreferTarget => "Keeping version from project",
                    ConflictPolicy::PreferSource | ConflictPolicy::ErrorOnConflict => {
                        "Keeping version from template"
                    }
                };
                report.note(format!(
                    "{kept}: {}",
                    display_version(&overlap.resolved_version)
                ));
            }
            report.manifest_merge = Some(merge);
            if verify_manifest(fs, target) {
                report.note(format!("Successfully merged {manifest} files"));
            } else {
                report.error(&manifest, format!("Merged {manifest} could not be read back"));
            }
        }
        Err(err) => {
            report.error(&manifest, format!("Error merging {manifest} files: {err:#}"));
        }
    }
}

fn is_regular_file(fs: &dyn FileSystem, path: &Path) -> bool {
    fs.exists(path) && !fs.is_dir(path)
}

fn display_version(version: &str) -> &str {
    if version.is_empty() {
        "(unpinned)"
    } else {
        version
    }
}

fn canonical_skip_list(fs: &dyn FileSystem, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|path| fs.canonicalize(path).unwrap_or_else(|_| path.clone()))
        .collect()
}

fn is_skipped(fs: &dyn FileSystem, path: &Path, skip: &[PathBuf]) -> bool {
    if skip.is_empty() {
        return false;
    }
    let canonical = fs
        .canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf());
    skip.iter().any(|item| *item == canonical)
}

/// Run a synchronization and summarize it as an [`ExecutionOutcome`].
pub fn sync_project(effects: &dyn Effects, request: &SyncRequest) -> ExecutionOutcome {
    let fs = effects.fs();
    let created = match prepare_target(fs, &request.target) {
        Ok(created) => created,
        Err(err) => {
            return ExecutionOutcome::user_error(
                format!("Error creating target directory: {err:#}"),
                json!({ "target": request.target.display().to_string() }),
            );
        }
    };

    let mut report = synchronize(fs, request);
    if created {
        report.notes.insert(
            0,
            format!(
                "Target directory {} does not exist. Creating it...",
                request.target.display()
            ),
        );
    }

    let details = json!({
        "template": request.template_root.display().to_string(),
        "target": request.target.display().to_string(),
        "created_target": created,
        "copied_files": report.copied_files,
        "copied_dirs": report.copied_dirs,
        "merged_dirs": report.merged_dirs,
        "overwritten": report.overwritten,
        "manifest_merge": report.manifest_merge,
        "errors": report.errors,
        "missing_essentials": report.missing_essentials,
        "notes": report.notes,
        "hint": if report.succeeded() {
            "You can now continue with the remaining setup steps as outlined in the README."
        } else {
            "Inspect the errors above and copy the missing items by hand."
        },
    });

    if report.succeeded() {
        ExecutionOutcome::success("All files were copied successfully!", details)
    } else {
        ExecutionOutcome::partial(
            "Some files could not be copied. Please check the errors above.",
            details,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::SystemEffects;
    use crate::outcome::CommandStatus;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        template: PathBuf,
        target: PathBuf,
    }

    fn fixture() -> Result<Fixture> {
        let dir = tempdir()?;
        let template = dir.path().join("template");
        let target = dir.path().join("project");
        fs::create_dir_all(&template)?;
        fs::create_dir_all(&target)?;
        Ok(Fixture {
            _dir: dir,
            template,
            target,
        })
    }

    fn scaffold_template(root: &Path) -> Result<()> {
        fs::write(root.join(".env"), "DEBUG=1\n")?;
        fs::write(root.join("docker-compose.yml"), "services: {}\n")?;
        fs::create_dir_all(root.join("config"))?;
        fs::write(root.join("config/settings.yaml"), "template: true\n")?;
        fs::create_dir_all(root.join("database/migrations"))?;
        fs::write(root.join("database/migrations/0001.sql"), "create table t();\n")?;
        fs::create_dir_all(root.join("docker"))?;
        fs::write(root.join("docker/Dockerfile"), "FROM python:3.12\n")?;
        fs::write(root.join("requirements.txt"), "fastapi==0.110\nbar>=1.0\n")?;
        Ok(())
    }

    fn request(fixture: &Fixture) -> SyncRequest {
        SyncRequest {
            template_root: fixture.template.clone(),
            target: fixture.target.clone(),
            settings: SyncSettings::default(),
            skip_paths: Vec::new(),
        }
    }

    #[test]
    fn fresh_target_receives_full_scaffold() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        let effects = SystemEffects::new();

        let report = synchronize(effects.fs(), &request(&fx));

        assert!(report.succeeded(), "{:?}", report.errors);
        assert_eq!(report.copied_dirs, vec!["config", "database", "docker"]);
        assert!(report.manifest_merge.is_none());
        assert_eq!(
            fs::read_to_string(fx.target.join("requirements.txt"))?,
            "fastapi==0.110\nbar>=1.0\n"
        );
        assert!(fx.target.join("database/migrations/0001.sql").is_file());
        Ok(())
    }

    #[test]
    fn existing_directories_never_lose_files() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        fs::create_dir_all(fx.target.join("config"))?;
        fs::write(fx.target.join("config/settings.yaml"), "project: true\n")?;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &request(&fx));

        assert_eq!(
            fs::read_to_string(fx.target.join("config/settings.yaml"))?,
            "project: true\n"
        );
        assert_eq!(report.merged_dirs, vec!["config"]);
        assert!(!report
            .copied_files
            .iter()
            .any(|path| path.ends_with("settings.yaml")));
        Ok(())
    }

    #[test]
    fn directory_merge_fills_in_missing_nested_files() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        fs::create_dir_all(fx.target.join("database"))?;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &request(&fx));

        assert_eq!(
            fs::read_to_string(fx.target.join("database/migrations/0001.sql"))?,
            "create table t();\n"
        );
        let expected = Path::new("database")
            .join("migrations")
            .join("0001.sql")
            .display()
            .to_string();
        assert!(report.copied_files.contains(&expected));
        Ok(())
    }

    #[test]
    fn top_level_files_are_overwritten() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        fs::write(fx.target.join(".env"), "DEBUG=0\n")?;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &request(&fx));

        assert_eq!(fs::read_to_string(fx.target.join(".env"))?, "DEBUG=1\n");
        assert_eq!(report.overwritten, vec![".env"]);
        assert!(report
            .notes
            .iter()
            .any(|note| note == "File .env already exists in target, overwriting..."));
        Ok(())
    }

    #[test]
    fn shared_manifest_is_merged_not_overwritten() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        fs::write(fx.target.join("requirements.txt"), "bar==0.9\nnumpy\n")?;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &request(&fx));

        assert_eq!(
            fs::read_to_string(fx.target.join("requirements.txt"))?,
            "bar>=1.0\nfastapi==0.110\nnumpy\n"
        );
        let merge = report.manifest_merge.expect("manifest merged");
        assert_eq!(merge.overlaps.len(), 1);
        assert!(report
            .notes
            .iter()
            .any(|note| note == "Keeping version from template: >=1.0"));
        assert!(!report.overwritten.contains(&"requirements.txt".to_string()));
        Ok(())
    }

    #[test]
    fn directory_named_like_manifest_is_merged_as_directory() -> Result<()> {
        let fx = fixture()?;
        fs::create_dir_all(fx.template.join("requirements.txt"))?;
        fs::write(fx.template.join("requirements.txt/a.txt"), "from template\n")?;
        fs::create_dir_all(fx.target.join("requirements.txt"))?;
        fs::write(fx.target.join("requirements.txt/b.txt"), "from project\n")?;
        let mut req = request(&fx);
        req.settings.essential_paths.clear();

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &req);

        assert!(report.succeeded(), "{:?}", report.errors);
        assert!(report.manifest_merge.is_none());
        assert_eq!(report.merged_dirs, vec!["requirements.txt"]);
        assert_eq!(
            fs::read_to_string(fx.target.join("requirements.txt/a.txt"))?,
            "from template\n"
        );
        assert_eq!(
            fs::read_to_string(fx.target.join("requirements.txt/b.txt"))?,
            "from project\n"
        );
        Ok(())
    }

    #[test]
    fn failed_manifest_merge_marks_run_partial_and_continues() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        fs::write(fx.target.join("requirements.txt"), "bar==0.9\n")?;
        let mut req = request(&fx);
        req.settings.conflict_policy = ConflictPolicy::ErrorOnConflict;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &req);

        assert!(!report.succeeded());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].entry, "requirements.txt");
        assert_eq!(
            fs::read_to_string(fx.target.join("requirements.txt"))?,
            "bar==0.9\n"
        );
        assert!(fx.target.join("docker/Dockerfile").is_file());
        Ok(())
    }

    #[test]
    fn per_entry_errors_do_not_stop_the_run() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        // A directory where the template has a plain file cannot be overwritten.
        fs::create_dir_all(fx.target.join("docker-compose.yml"))?;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &request(&fx));

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].entry, "docker-compose.yml");
        assert!(report.errors[0].message.starts_with("Error copying docker-compose.yml"));
        assert!(fx.target.join("docker/Dockerfile").is_file());
        assert!(fx.target.join(".env").is_file());
        Ok(())
    }

    #[test]
    fn missing_essentials_are_reported() -> Result<()> {
        let fx = fixture()?;
        fs::write(fx.template.join(".env"), "A=1\n")?;

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &request(&fx));

        assert!(report.errors.is_empty());
        assert_eq!(
            report.missing_essentials,
            vec!["docker-compose.yml", "config", "database", "docker"]
        );
        assert!(!report.succeeded());
        Ok(())
    }

    #[test]
    fn excluded_and_skipped_entries_are_left_behind() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        fs::write(fx.template.join("setup-tool"), "binary")?;
        fs::write(fx.template.join("README.md"), "# template\n")?;
        let mut req = request(&fx);
        req.settings.exclude = vec!["README.md".to_string()];
        req.skip_paths = vec![fx.template.join("setup-tool")];

        let effects = SystemEffects::new();
        let report = synchronize(effects.fs(), &req);

        assert!(report.succeeded());
        assert!(!fx.target.join("setup-tool").exists());
        assert!(!fx.target.join("README.md").exists());
        Ok(())
    }

    #[test]
    fn sync_project_creates_target_and_reports_success() -> Result<()> {
        let fx = fixture()?;
        scaffold_template(&fx.template)?;
        let mut req = request(&fx);
        req.target = fx.target.join("nested/new-project");

        let outcome = sync_project(&SystemEffects::new(), &req);

        assert_eq!(outcome.status, CommandStatus::Ok);
        assert_eq!(outcome.details["created_target"], true);
        assert!(outcome.notes()[0].ends_with("does not exist. Creating it..."));
        assert!(req.target.join(".env").is_file());
        Ok(())
    }

    #[test]
    fn sync_project_rejects_file_target() -> Result<()> {
        let fx = fixture()?;
        let file_target = fx.target.join("not-a-dir");
        fs::write(&file_target, "")?;
        let mut req = request(&fx);
        req.target = file_target;

        let outcome = sync_project(&SystemEffects::new(), &req);
        assert_eq!(outcome.status, CommandStatus::UserError);
        Ok(())
    }
}
