//! Operator-facing output
//!
//! Every `render_*` function is pure; [`Presenter`] writes their output to a
//! stream and ignores write failures, so rendering never affects the run.

use std::io::{self, Write};

use colored::Colorize;
use serde_json::Value;

use crate::common::{ApiError, StepError};
use crate::fixtures::InvoiceSummary;

const RULE_WIDTH: usize = 80;

/// Render a section header
pub fn render_section(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{}\n{}\n{}\n\n",
        rule.cyan(),
        format!("  {title}").cyan().bold(),
        rule.cyan()
    )
}

/// Render the opening/closing banner
pub fn render_banner(lines: &[&str]) -> String {
    let rule = "█".repeat(RULE_WIDTH);
    let mut out = format!("\n{}\n", rule.magenta());
    for (i, line) in lines.iter().enumerate() {
        let line = format!("  {line}");
        if i == 0 {
            out.push_str(&format!("{}\n", line.magenta().bold()));
        } else {
            out.push_str(&format!("{}\n", line.white()));
        }
    }
    out.push_str(&format!("{}\n", rule.magenta()));
    out
}

/// Render a success record, with the payload pretty-printed when present
pub fn render_success(message: &str, payload: Option<&Value>) -> String {
    let mut out = format!("{} {}\n", "✓".green(), message.green());
    if let Some(payload) = payload {
        out.push_str(&format!("{}\n", pretty(payload).dimmed()));
    }
    out.push('\n');
    out
}

/// Render a failure record
///
/// Transport errors, HTTP error responses and unusable payloads each get
/// their own shape.
pub fn render_failure(message: &str, error: &StepError) -> String {
    let mut out = format!("{} {}\n", "✗".red(), message.red());
    match error {
        StepError::Api(ApiError::Transport { message }) => {
            out.push_str(&format!("{} {}\n", "Error:".yellow(), message.dimmed()));
        }
        StepError::Api(ApiError::Response { status, body }) => {
            out.push_str(&format!("{} {}\n", "Status:".yellow(), status));
            out.push_str(&format!("{} {}\n", "Error:".yellow(), pretty(body).dimmed()));
        }
        StepError::UnexpectedPayload { reason, body } => {
            out.push_str(&format!("{} {}\n", "Unexpected:".yellow(), reason));
            out.push_str(&format!("{} {}\n", "Body:".yellow(), pretty(body).dimmed()));
        }
        StepError::MissingContext { .. } => {
            out.push_str(&format!("{} {}\n", "Error:".yellow(), error));
        }
    }
    out.push('\n');
    out
}

/// Render a warning, used for anomalies that do not fail the run
pub fn render_warning(message: &str) -> String {
    format!("{} {}\n\n", "⚠".yellow().bold(), message.yellow().bold())
}

/// Render an informational notice
pub fn render_info(message: &str) -> String {
    format!("{} {}\n", "ℹ".blue(), message.blue())
}

/// Render the computed fields of a created invoice
pub fn render_invoice_summary(summary: &InvoiceSummary) -> String {
    format!(
        "{}\n   Number: {}\n   Subtotal: ${}\n   Taxes: ${}\n   Discounts: ${}\n   {}\n\n",
        "Invoice Summary:".yellow().bold(),
        scalar(&summary.number),
        scalar(&summary.subtotal),
        scalar(&summary.taxes),
        scalar(&summary.discounts),
        format!("TOTAL: ${}", scalar(&summary.total)).green().bold()
    )
}

/// Strings without their JSON quotes, everything else as JSON
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Writes rendered records to an output stream
pub struct Presenter<W: Write> {
    out: W,
}

impl Presenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, lines: &[&str]) {
        self.emit(&render_banner(lines));
    }

    pub fn section(&mut self, title: &str) {
        self.emit(&render_section(title));
    }

    pub fn success(&mut self, message: &str, payload: Option<&Value>) {
        self.emit(&render_success(message, payload));
    }

    pub fn failure(&mut self, message: &str, error: &StepError) {
        self.emit(&render_failure(message, error));
    }

    pub fn warning(&mut self, message: &str) {
        self.emit(&render_warning(message));
    }

    pub fn info(&mut self, message: &str) {
        self.emit(&render_info(message));
    }

    pub fn invoice_summary(&mut self, summary: &InvoiceSummary) {
        self.emit(&render_invoice_summary(summary));
    }

    /// Write a pre-rendered line as-is
    pub fn line(&mut self, text: &str) {
        self.emit(&format!("{text}\n"));
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "presenter write failed");
        }
    }
}
