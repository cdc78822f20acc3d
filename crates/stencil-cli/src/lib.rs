#![deny(clippy::all, warnings)]

pub mod output;
pub mod style;

pub use output::{emit_output, OutputArgs};

/// Route `tracing` events from the stencil crates to stderr; `-v` raises the
/// level from warn through info and debug to trace.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = format!("stencil_core={level},stencil_domain={level},stencil_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
