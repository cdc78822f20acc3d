use atty::Stream;
use clap::{ArgAction, Args};
use color_eyre::Result;
use serde_json::Value;
use stencil_core::{to_json_response, ExecutionOutcome};

use crate::style::Style;

/// Output flags shared by every stencil binary.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    #[arg(short, long, help = "Suppress human output")]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vvv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes")]
    pub json: bool,
    #[arg(long, help = "Disable colored human output")]
    pub no_color: bool,
}

/// Print `outcome` either as a JSON envelope or as notes followed by a status
/// line and optional hint.
pub fn emit_output(args: &OutputArgs, command: &str, outcome: &ExecutionOutcome) -> Result<()> {
    if args.json {
        let payload = to_json_response(command, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if args.quiet {
        return Ok(());
    }

    let style = Style::new(args.no_color, atty::is(Stream::Stdout));
    let notes = outcome.notes();
    for note in &notes {
        println!("{}", style.note(note));
    }
    if !notes.is_empty() {
        println!();
    }
    println!("{}", style.status(outcome.status, &outcome.message));
    if let Some(hint) = hint_from_details(&outcome.details) {
        println!("{}", style.info(&format!("Hint: {hint}")));
    }
    Ok(())
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
