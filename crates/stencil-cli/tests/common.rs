#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::assert::Assert;
use serde_json::Value;
use tempfile::TempDir;

pub const TYPES_CONFIG_DIR: &str = "backend/app/core/third_party_integrations/payments/api";

/// A template tree and an (empty) project directory side by side.
pub fn prepare_scaffold(prefix: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let template = temp.path().join("template");
    let project = temp.path().join("project");
    fs::create_dir_all(&project).expect("project dir");
    write_file(&template, ".env", "DATABASE_URL=postgres://localhost/app\n");
    write_file(&template, "docker-compose.yml", "services:\n  db: {}\n");
    write_file(&template, "config/settings.yaml", "debug: false\n");
    write_file(&template, "config/logging.yaml", "level: info\n");
    write_file(&template, "database/init.sql", "create schema app;\n");
    write_file(&template, "docker/Dockerfile", "FROM python:3.12-slim\n");
    write_file(
        &template,
        "requirements.txt",
        "fastapi==0.110.0\nsqlalchemy>=2.0\n# tooling\nruff\n",
    );
    (temp, template, project)
}

/// A project with an imports config, a schema file, and module files.
pub fn prepare_imports_project(
    prefix: &str,
    schema: &str,
    modules: &[&str],
) -> (TempDir, PathBuf) {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let root = temp.path().to_path_buf();
    let listed = modules
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ");
    write_file(
        &root,
        &format!("{TYPES_CONFIG_DIR}/_types.toml"),
        &format!(
            "[types_config]\n\
             relative_file_path = \"{TYPES_CONFIG_DIR}/_schema.py\"\n\
             types = [{listed}]\n"
        ),
    );
    write_file(&root, &format!("{TYPES_CONFIG_DIR}/_schema.py"), schema);
    for module in modules {
        write_file(&root, &format!("{TYPES_CONFIG_DIR}/{module}"), "");
    }
    (temp, root)
}

pub fn schema_path(root: &Path) -> PathBuf {
    root.join(TYPES_CONFIG_DIR).join("_schema.py")
}

pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, contents).expect("write file");
}

pub fn read_file(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).expect("read file")
}

pub fn stdout(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}
