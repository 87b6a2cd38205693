//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across all commands.

use console::style;
use serde::Serialize;
use shelf_core::PartialFailure;

use super::OutputConfig;

/// JSON shape of a partially completed operation
#[derive(Debug, Serialize)]
struct PartialOutput<'a> {
    error: String,
    operation: &'a str,
    completed: &'a [String],
    pending: &'a [String],
}

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, all output is strict JSON without colors or progress.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet {
            return;
        }

        if self.config.json {
            // In JSON mode, success is indicated by exit code, not message
            return;
        }

        if self.colors_enabled() {
            println!("{} {message}", style("✓").green());
        } else {
            println!("✓ {message}");
        }
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({
                "error": message
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else if self.colors_enabled() {
            eprintln!("{} {message}", style("✗").red().for_stderr());
        } else {
            eprintln!("✗ {message}");
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }

        if self.colors_enabled() {
            eprintln!("{} {message}", style("⚠").yellow().for_stderr());
        } else {
            eprintln!("⚠ {message}");
        }
    }

    /// Output an operation that stopped half way
    ///
    /// Nothing is rolled back, so both what was written and what was never
    /// reached are listed. Always printed, like errors.
    pub fn partial(&self, context: &str, failure: &PartialFailure) {
        if self.config.json {
            match serde_json::to_string_pretty(&partial_output(failure)) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => self.error(&failure.to_string()),
            }
            return;
        }

        self.error(&format!("{context}: {failure}"));
        for line in partial_lines(failure) {
            if self.colors_enabled() {
                eprintln!("  {}", style(line).yellow().for_stderr());
            } else {
                eprintln!("  {line}");
            }
        }
    }

    /// Output JSON directly
    ///
    /// Used when you want to output a pre-built JSON structure.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Dim a secondary piece of text when colors are on
    pub fn dim(&self, text: &str) -> String {
        if self.colors_enabled() {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

fn partial_output(failure: &PartialFailure) -> PartialOutput<'_> {
    PartialOutput {
        error: failure.to_string(),
        operation: &failure.operation,
        completed: &failure.completed,
        pending: &failure.pending,
    }
}

fn partial_lines(failure: &PartialFailure) -> Vec<String> {
    let done = failure.completed.iter().map(|key| format!("done: {key}"));
    let missed = failure.pending.iter().map(|key| format!("not reached: {key}"));
    done.chain(missed).collect()
}
