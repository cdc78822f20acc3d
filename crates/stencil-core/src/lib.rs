#![deny(clippy::all, warnings)]

mod config;
mod effects;
mod fs;
mod imports;
mod manifest;
mod outcome;
mod sync;

pub use stencil_domain::{ConflictPolicy, ImportsConfig, MergeReport, NamingMode, PackageSet};

pub use crate::config::{EnvSnapshot, SyncSettings};
pub use crate::effects::{Effects, FileSystem, SystemEffects, WalkEntry};
pub use crate::imports::{
    insert_imports, load_imports_config, locate_imports_config, run_imports, ImportReport,
    ImportsRequest, INTEGRATIONS_DIR, TYPES_CONFIG_FILE,
};
pub use crate::manifest::{merge_manifest_files, merge_manifests, verify_manifest};
pub use crate::outcome::{to_json_response, CommandStatus, ExecutionOutcome};
pub use crate::sync::{
    prepare_target, sync_project, synchronize, EntryError, SyncReport, SyncRequest,
};
