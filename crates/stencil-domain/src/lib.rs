#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod imports;
pub mod manifest;

pub use imports::{
    apply_insertion, file_stem, imports_config_from_str, pascal_case_identifier, plan_insertion,
    render_lines, ConfigError, ImportSpec, ImportsConfig, InsertionPlan, NamingMode,
    DEFAULT_CONVERSION_METHOD, DEFAULT_FAMILY_MARKER, DEFAULT_IMPORT_METHOD,
};
pub use manifest::{
    merge_package_sets, parse_declaration, parse_manifest, render_manifest, ConflictPolicy,
    ManifestConflict, MergeReport, Overlap, PackageConstraint, PackageSet,
};
