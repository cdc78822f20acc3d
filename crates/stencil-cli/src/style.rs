use std::env;

use color_eyre::owo_colors::{OwoColorize, Style as Paint};
use stencil_core::CommandStatus;

/// Terminal styling for human output; a no-op unless stdout is a color TTY.
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(no_color_flag: bool, is_tty: bool) -> Self {
        let enabled = is_tty && !no_color_flag && env::var_os("NO_COLOR").is_none();
        Self { enabled }
    }

    pub fn status(&self, status: CommandStatus, text: &str) -> String {
        let (symbol, paint) = match status {
            CommandStatus::Ok => ("✔", Paint::new().green()),
            CommandStatus::Partial => ("!", Paint::new().yellow()),
            CommandStatus::UserError => ("✗", Paint::new().yellow()),
            CommandStatus::Failure => ("✖", Paint::new().red()),
        };
        self.paint(&format!("{symbol} {text}"), paint.bold())
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, Paint::new().cyan())
    }

    /// Per-item diagnostics; warnings and errors stand out, the rest stays plain.
    pub fn note(&self, text: &str) -> String {
        if text.starts_with("Error") {
            self.paint(text, Paint::new().red())
        } else if text.starts_with("Warning") {
            self.paint(text, Paint::new().yellow())
        } else {
            text.to_string()
        }
    }

    fn paint(&self, text: &str, paint: Paint) -> String {
        if self.enabled {
            text.style(paint).to_string()
        } else {
            text.to_string()
        }
    }
}
