//! Spinner and result printing for commands that wait on operations
//!
//! The spinner is fed by the core's progress events, so it reflects every
//! status fetch without the command knowing about polling at all.

use std::time::Duration;

use colored::Colorize;
use computectl_core::{OperationState, OperationStatus, ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::error::Result as CliResult;
use crate::output::print_output;

/// Spinner shown on stderr while an operation is in flight
pub struct OperationSpinner {
    bar: ProgressBar,
}

impl OperationSpinner {
    /// Visible spinner for human output, hidden for machine-readable output
    pub fn for_output(output_format: OutputFormat) -> Self {
        if output_format != OutputFormat::Auto {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Progress callback that updates this spinner
    pub fn callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        Arc::new(move |event: ProgressEvent| match &event {
            ProgressEvent::Started { operation } => {
                bar.set_message(format!("Operation {} submitted", operation));
            }
            ProgressEvent::Polling {
                operation,
                status,
                progress,
                ..
            } => {
                bar.set_message(format!(
                    "Operation {}: {}",
                    operation,
                    format_state(*status, *progress)
                ));
            }
            ProgressEvent::Completed { operation, .. } => {
                bar.finish_with_message(format!(
                    "Operation {}: {}",
                    operation,
                    format_state(OperationState::Done, None)
                ));
            }
            ProgressEvent::Failed { operation, error } => {
                bar.abandon_with_message(format!(
                    "Operation {} {}: {}",
                    operation,
                    "\u{2717} failed".red(),
                    error
                ));
            }
        })
    }

    /// Clear the spinner if no terminal event did
    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Format operation state for display with status icons
fn format_state(state: OperationState, progress: Option<u8>) -> String {
    let label = match progress {
        Some(pct) if state != OperationState::Done => format!("{} ({}%)", state, pct),
        _ => state.to_string(),
    };
    match state {
        OperationState::Done => format!("\u{2713} {}", label), // checkmark
        OperationState::Running => format!("\u{21bb} {}", label), // arrow circle
        OperationState::Pending => label,
    }
}

/// Print a finished mutation
pub fn print_status(
    status: &OperationStatus,
    summary: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    match output_format {
        OutputFormat::Auto => {
            println!("{} {}", "\u{2713}".green(), summary);
            println!("  operation: {}", status.name);
            for warning in &status.warnings {
                println!("  {}: {} {}", "warning".yellow(), warning.code, warning.message);
            }
            Ok(())
        }
        _ => print_output(status, output_format),
    }
}

/// Print a status snapshot, terminal or not
pub fn print_snapshot(status: &OperationStatus, output_format: OutputFormat) -> CliResult<()> {
    match output_format {
        OutputFormat::Auto => {
            println!(
                "{}: {}",
                status.name,
                format_state(status.status, status.progress)
            );
            if let Some(kind) = &status.operation_type {
                println!("  type:   {}", kind);
            }
            if let Some(target) = status.target_name() {
                println!("  target: {}", target);
            }
            for error in status.errors() {
                println!("  {}: {}", "error".red(), error);
            }
            Ok(())
        }
        _ => print_output(status, output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_gets_a_checkmark() {
        assert!(format_state(OperationState::Done, None).starts_with('\u{2713}'));
        assert!(format_state(OperationState::Done, Some(100)).ends_with("DONE"));
    }

    #[test]
    fn running_shows_progress() {
        let text = format_state(OperationState::Running, Some(40));
        assert!(text.contains("RUNNING"));
        assert!(text.contains("40%"));
    }

    #[test]
    fn pending_is_plain() {
        assert_eq!(format_state(OperationState::Pending, None), "PENDING");
    }

    #[test]
    fn hidden_spinner_accepts_events() {
        let spinner = OperationSpinner::for_output(OutputFormat::Json);
        let callback = spinner.callback();
        callback(ProgressEvent::Started {
            operation: "op-1".to_string(),
        });
        callback(ProgressEvent::Completed {
            operation: "op-1".to_string(),
            target: None,
        });
        spinner.finish();
    }
}
