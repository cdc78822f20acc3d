//! Import statement generation and insertion planning for schema files.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

mod config;

pub use config::{
    imports_config_from_str, ConfigError, ImportsConfig, DEFAULT_CONVERSION_METHOD,
    DEFAULT_FAMILY_MARKER, DEFAULT_IMPORT_METHOD,
};

/// How a module file name becomes the imported identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingMode {
    /// `user_profile.py` imports `UserProfile`.
    PascalCase,
    /// `user_profile.py` imports `user_profile`.
    Verbatim,
}

impl NamingMode {
    /// Maps a `conversion_method` config value onto a mode. `camel_case` is the
    /// historical spelling of the PascalCase transform; anything unknown is
    /// treated as verbatim.
    pub fn from_conversion_method(value: &str) -> Self {
        match value.trim() {
            "camel_case" | "pascal_case" => NamingMode::PascalCase,
            _ => NamingMode::Verbatim,
        }
    }

    pub fn identifier(self, file_name: &str) -> String {
        let stem = file_stem(file_name);
        match self {
            NamingMode::PascalCase => pascal_case_identifier(stem),
            NamingMode::Verbatim => stem.to_string(),
        }
    }
}

/// File name without directories or its final extension.
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// `user_profile` -> `UserProfile`. Each underscore-separated segment is
/// capitalized: first character uppercased, the rest lowercased.
pub fn pascal_case_identifier(stem: &str) -> String {
    stem.split('_').map(capitalize).collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportSpec {
    /// `<prefix>.<stem>`, everything before ` import `.
    pub import_target: String,
    pub identifier: String,
    pub statement: String,
}

impl ImportSpec {
    /// Build `<prefix>.<stem> import <identifier>` for `file_name`.
    pub fn new(import_prefix: &str, file_name: &str, mode: NamingMode) -> Self {
        let stem = file_stem(file_name);
        let identifier = mode.identifier(file_name);
        let import_target = format!("{import_prefix}.{stem}");
        let statement = format!("{import_target} import {identifier}");
        Self {
            import_target,
            identifier,
            statement,
        }
    }
}

/// Where and what to splice into an existing file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InsertionPlan {
    /// Index of the last line belonging to the import family, if any.
    pub anchor: Option<usize>,
    /// Line index the additions are inserted at.
    pub index: usize,
    pub additions: Vec<String>,
    /// Statements dropped because the file (or the batch) already has them.
    pub already_present: Vec<String>,
}

impl InsertionPlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.additions.is_empty()
    }
}

/// Decide which `statements` are missing from `lines` and where they go.
///
/// A statement counts as present only when some line equals it exactly. New
/// statements land right after the last line starting with `marker`, or at
/// the top of the file when no such line exists.
pub fn plan_insertion(lines: &[String], marker: &str, statements: &[String]) -> InsertionPlan {
    let anchor = lines.iter().rposition(|line| line.starts_with(marker));
    let existing: HashSet<&str> = lines.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let mut additions = Vec::new();
    let mut already_present = Vec::new();
    for statement in statements {
        if existing.contains(statement.as_str()) || !seen.insert(statement.as_str()) {
            already_present.push(statement.clone());
        } else {
            additions.push(statement.clone());
        }
    }

    InsertionPlan {
        anchor,
        index: anchor.map_or(0, |idx| idx + 1),
        additions,
        already_present,
    }
}

/// Splice the plan's additions into `lines`, keeping every other line in order.
pub fn apply_insertion(mut lines: Vec<String>, plan: &InsertionPlan) -> Vec<String> {
    let index = plan.index.min(lines.len());
    lines.splice(index..index, plan.additions.iter().cloned());
    lines
}

/// Join lines with `\n` and end with exactly one trailing newline.
pub fn render_lines(lines: &[String]) -> String {
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}
