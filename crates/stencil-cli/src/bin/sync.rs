use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use stencil_cli::{emit_output, init_tracing, OutputArgs};
use stencil_core::{
    sync_project, CommandStatus, ConflictPolicy, SyncRequest, SyncSettings, SystemEffects,
};

const COMMAND: &str = "stencil-sync";

#[derive(Parser, Debug)]
#[command(
    name = "stencil-sync",
    version,
    about = "Copy a project template into TARGET, merging directories and requirements.txt"
)]
struct SyncCli {
    #[arg(value_name = "TARGET", help = "Project directory receiving the template")]
    target: PathBuf,
    #[arg(
        long,
        value_name = "DIR",
        help = "Template root (defaults to the current directory)"
    )]
    template: Option<PathBuf>,
    #[arg(
        long,
        value_name = "NAME",
        help = "Dependency manifest merged instead of overwritten [env: STENCIL_MANIFEST]"
    )]
    manifest: Option<String>,
    #[arg(
        long = "essential",
        value_name = "PATH",
        help = "Path that must exist in TARGET afterwards (repeatable) [env: STENCIL_ESSENTIALS]"
    )]
    essentials: Vec<String>,
    #[arg(long, value_name = "NAME", help = "Template entry to leave out (repeatable)")]
    exclude: Vec<String>,
    #[arg(
        long,
        value_enum,
        help = "How overlapping packages are resolved [env: STENCIL_CONFLICT_POLICY]"
    )]
    conflict_policy: Option<PolicyArg>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    PreferSource,
    PreferTarget,
    ErrorOnConflict,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::PreferSource => ConflictPolicy::PreferSource,
            PolicyArg::PreferTarget => ConflictPolicy::PreferTarget,
            PolicyArg::ErrorOnConflict => ConflictPolicy::ErrorOnConflict,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = match SyncCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_tracing(cli.output.verbose);

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{COMMAND}: {err:#}");
            std::process::exit(1);
        }
    };
    let template_root = match &cli.template {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|err| eyre!("cannot read current directory: {err}"))?,
    };
    let request = SyncRequest {
        template_root,
        target: cli.target.clone(),
        settings,
        skip_paths: std::env::current_exe().into_iter().collect(),
    };

    let outcome = sync_project(&SystemEffects::new(), &request);
    emit_output(&cli.output, COMMAND, &outcome)?;

    match outcome.status {
        CommandStatus::Ok | CommandStatus::Partial => Ok(()),
        CommandStatus::UserError | CommandStatus::Failure => std::process::exit(1),
    }
}

/// Flags override the environment, which overrides the defaults.
fn resolve_settings(cli: &SyncCli) -> anyhow::Result<SyncSettings> {
    let mut settings = SyncSettings::from_env()?;
    if let Some(manifest) = &cli.manifest {
        settings.manifest_name.clone_from(manifest);
    }
    if !cli.essentials.is_empty() {
        settings.essential_paths.clone_from(&cli.essentials);
    }
    settings.exclude.extend(cli.exclude.iter().cloned());
    if let Some(policy) = cli.conflict_policy {
        settings.conflict_policy = policy.into();
    }
    Ok(settings)
}
