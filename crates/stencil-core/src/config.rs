use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use serde::Serialize;
use stencil_domain::ConflictPolicy;

pub const DEFAULT_MANIFEST_NAME: &str = "requirements.txt";
pub const DEFAULT_ESSENTIAL_PATHS: [&str; 5] =
    [".env", "docker-compose.yml", "config", "database", "docker"];

const MANIFEST_ENV: &str = "STENCIL_MANIFEST";
const ESSENTIALS_ENV: &str = "STENCIL_ESSENTIALS";
const CONFLICT_POLICY_ENV: &str = "STENCIL_CONFLICT_POLICY";

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Variables whose name or value is not UTF-8 are left out.
    pub fn capture() -> Self {
        let vars = env::vars_os()
            .filter_map(|(key, value)| {
                Some((key.into_string().ok()?, value.into_string().ok()?))
            })
            .collect();
        Self { vars }
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Knobs for a directory synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSettings {
    /// File name merged instead of overwritten when both trees carry it.
    pub manifest_name: String,
    /// Paths that must exist under the target after the run.
    pub essential_paths: Vec<String>,
    /// Top-level template entries never copied.
    pub exclude: Vec<String>,
    pub conflict_policy: ConflictPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            essential_paths: DEFAULT_ESSENTIAL_PATHS
                .iter()
                .map(ToString::to_string)
                .collect(),
            exclude: Vec::new(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl SyncSettings {
    /// Builds settings from the current process environment.
    ///
    /// # Errors
    /// Returns an error if `STENCIL_CONFLICT_POLICY` names an unknown policy.
    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub fn from_snapshot(snapshot: &EnvSnapshot) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(name) = snapshot.var(MANIFEST_ENV).map(str::trim) {
            if !name.is_empty() {
                settings.manifest_name = name.to_string();
            }
        }
        if let Some(raw) = snapshot.var(ESSENTIALS_ENV) {
            settings.essential_paths = split_list(raw);
        }
        if let Some(raw) = snapshot.var(CONFLICT_POLICY_ENV) {
            settings.conflict_policy = raw
                .parse()
                .with_context(|| format!("invalid {CONFLICT_POLICY_ENV}"))?;
        }
        Ok(settings)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
