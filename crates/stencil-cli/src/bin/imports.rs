use std::path::PathBuf;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use stencil_cli::{emit_output, init_tracing, OutputArgs};
use stencil_core::{run_imports, ImportsRequest, SystemEffects};

const COMMAND: &str = "stencil-imports";

#[derive(Parser, Debug)]
#[command(
    name = "stencil-imports",
    version,
    about = "Insert missing library type imports into the generated schema file"
)]
struct ImportsCli {
    #[arg(
        long,
        num_args = 1..,
        value_name = "FILE",
        help = "Module filenames to import, replacing the configured list"
    )]
    files: Vec<String>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Imports config \
                (defaults to backend/app/core/third_party_integrations/*/api/_types.toml)"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Project root the config paths are relative to (defaults to the current directory)"
    )]
    project_root: Option<PathBuf>,
    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = ImportsCli::parse();
    init_tracing(cli.output.verbose);

    let project_root = match &cli.project_root {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|err| eyre!("cannot read current directory: {err}"))?,
    };
    let request = ImportsRequest {
        project_root,
        config_path: cli.config.clone(),
        files: cli.files.clone(),
    };

    // Problems are reported in the output; the exit status stays zero.
    let outcome = run_imports(&SystemEffects::new(), &request);
    emit_output(&cli.output, COMMAND, &outcome)
}
