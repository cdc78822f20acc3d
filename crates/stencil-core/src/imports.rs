use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use stencil_domain::{
    apply_insertion, imports_config_from_str, plan_insertion, render_lines, ImportSpec,
    ImportsConfig,
};
use tracing::{debug, warn};

use crate::effects::{Effects, FileSystem};
use crate::outcome::ExecutionOutcome;

/// Directory (relative to the project root) whose `*/api/` folders may carry
/// an imports config.
pub const INTEGRATIONS_DIR: &str = "backend/app/core/third_party_integrations";
pub const TYPES_CONFIG_FILE: &str = "_types.toml";

#[derive(Debug, Clone, Default)]
pub struct ImportsRequest {
    pub project_root: PathBuf,
    /// Explicit config file; discovered under [`INTEGRATIONS_DIR`] when unset.
    pub config_path: Option<PathBuf>,
    /// Replaces the configured module list when non-empty.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub schema_path: String,
    pub candidates: Vec<String>,
    /// Candidates with no file next to the schema.
    pub missing: Vec<String>,
    pub added: Vec<String>,
    pub already_present: Vec<String>,
    /// Line index of the last existing import of the family.
    pub anchor: Option<usize>,
    pub written: bool,
    pub notes: Vec<String>,
}

/// First `<root>/backend/app/core/third_party_integrations/*/api/_types.toml`
/// in name order.
pub fn locate_imports_config(fs: &dyn FileSystem, project_root: &Path) -> Result<Option<PathBuf>> {
    let base = project_root.join(INTEGRATIONS_DIR);
    if !fs.is_dir(&base) {
        return Ok(None);
    }
    for integration in fs.list_dir(&base)? {
        let candidate = integration.join("api").join(TYPES_CONFIG_FILE);
        if fs.exists(&candidate) {
            debug!(path = %candidate.display(), "found imports config");
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

pub fn load_imports_config(fs: &dyn FileSystem, path: &Path) -> Result<ImportsConfig> {
    let contents = fs.read_to_string(path)?;
    Ok(imports_config_from_str(&contents, path)?)
}

/// Add an import line for every configured module file that exists next to
/// `schema_path` and is not imported yet.
///
/// The file is only rewritten when at least one statement is new, so running
/// this twice with the same inputs changes nothing the second time.
///
/// # Errors
/// Fails when the schema file cannot be read or written.
pub fn insert_imports(
    fs: &dyn FileSystem,
    schema_path: &Path,
    config: &ImportsConfig,
    files_override: &[String],
) -> Result<ImportReport> {
    let candidates = if files_override.is_empty() {
        config.module_files.clone()
    } else {
        files_override.to_vec()
    };
    let source_dir = schema_path.parent().unwrap_or_else(|| Path::new("."));
    let mut report = ImportReport {
        schema_path: schema_path.display().to_string(),
        candidates: candidates.clone(),
        ..ImportReport::default()
    };

    let mut statements = Vec::new();
    for name in &candidates {
        if fs.exists(&source_dir.join(name)) {
            let spec = ImportSpec::new(&config.import_prefix, name, config.naming_mode);
            debug!(module = %name, identifier = %spec.identifier, "import candidate");
            statements.push(spec.statement);
        } else {
            warn!(module = %name, dir = %source_dir.display(), "module file not found");
            report.missing.push(name.clone());
            report
                .notes
                .push(format!("Warning: {name} not found in {}", source_dir.display()));
        }
    }

    let contents = fs.read_to_string(schema_path)?;
    let lines: Vec<String> = contents.lines().map(ToString::to_string).collect();
    let plan = plan_insertion(&lines, &config.family_marker, &statements);
    report.anchor = plan.anchor;
    report.already_present.clone_from(&plan.already_present);

    if plan.is_noop() {
        report.notes.push("No new imports to add.".to_string());
        return Ok(report);
    }

    let updated = apply_insertion(lines, &plan);
    fs.write(schema_path, render_lines(&updated).as_bytes())?;
    report.notes.push(format!(
        "Added {} imports to {}",
        plan.additions.len(),
        schema_path.display()
    ));
    report.added = plan.additions;
    report.written = true;
    Ok(report)
}

/// Resolve the config and schema for `request`, then insert imports.
pub fn run_imports(effects: &dyn Effects, request: &ImportsRequest) -> ExecutionOutcome {
    let fs = effects.fs();
    let config_path = match &request.config_path {
        Some(path) => path.clone(),
        None => match locate_imports_config(fs, &request.project_root) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return ExecutionOutcome::user_error(
                    format!("No {TYPES_CONFIG_FILE} found under third_party_integrations"),
                    json!({
                        "project_root": request.project_root.display().to_string(),
                        "searched": INTEGRATIONS_DIR,
                    }),
                );
            }
            Err(err) => {
                return ExecutionOutcome::failure(
                    format!("failed to search for {TYPES_CONFIG_FILE}: {err:#}"),
                    json!({ "project_root": request.project_root.display().to_string() }),
                );
            }
        },
    };

    let config = match load_imports_config(fs, &config_path) {
        Ok(config) => config,
        Err(err) => {
            return ExecutionOutcome::user_error(
                format!("invalid imports config: {err:#}"),
                json!({ "config": config_path.display().to_string() }),
            );
        }
    };

    let schema_path = request.project_root.join(&config.target_file);
    if !fs.exists(&schema_path) {
        return ExecutionOutcome::user_error(
            format!("Schema file not found at {}", schema_path.display()),
            json!({
                "config": config_path.display().to_string(),
                "schema": schema_path.display().to_string(),
            }),
        );
    }

    match insert_imports(fs, &schema_path, &config, &request.files) {
        Ok(report) => {
            let message = if report.written {
                format!(
                    "Added {} imports to {}",
                    report.added.len(),
                    schema_path.display()
                )
            } else {
                "No new imports to add.".to_string()
            };
            ExecutionOutcome::success(
                message,
                json!({
                    "config": config_path.display().to_string(),
                    "schema": report.schema_path,
                    "candidates": report.candidates,
                    "missing": report.missing,
                    "added": report.added,
                    "already_present": report.already_present,
                    "anchor": report.anchor,
                    "written": report.written,
                    "notes": report.missing_notes(),
                }),
            )
        }
        Err(err) => ExecutionOutcome::failure(
            format!("failed to insert imports: {err:#}"),
            json!({
                "config": config_path.display().to_string(),
                "schema": schema_path.display().to_string(),
            }),
        ),
    }
}

impl ImportReport {
    /// Warnings only; the summary line already carries the result.
    fn missing_notes(&self) -> Vec<&str> {
        self.notes
            .iter()
            .map(String::as_str)
            .filter(|note| note.starts_with("Warning:"))
            .collect()
    }
}
