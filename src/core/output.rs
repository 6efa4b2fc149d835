//! Report rendering for CLI surfaces.
//!
//! Text reports stay bounded and readable; JSON reports are the canonical
//! result verbatim.

use crate::core::error::SpectralError;
use crate::core::result::ValidationResult;
use crate::core::validation_error::ErrorRecord;
use colored::Colorize;
use std::fmt::Write;

const MAX_MESSAGE_CHARS: usize = 160;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn render_json(result: &ValidationResult) -> Result<String, SpectralError> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn render_error(out: &mut String, error: &ErrorRecord) {
    let subject = match &error.test {
        Some(test) => format!("{}/{} [{}]", error.model, error.explore, test),
        None => format!("{}/{}", error.model, error.explore),
    };
    let _ = writeln!(
        out,
        "    {} {}",
        subject.bright_red().bold(),
        compact_line(&error.message, MAX_MESSAGE_CHARS)
    );
    for key in ["title", "url", "explore_url", "file_path", "line_number"] {
        if let Some(value) = error.metadata.get(key) {
            let shown = value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            let _ = writeln!(out, "      {}: {}", key.dimmed(), shown);
        }
    }
}

/// Human-readable report: one line per tested explore, then error details.
pub fn render_text(label: &str, result: &ValidationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("{} validation", label).bold());

    if result.tested.is_empty() {
        let _ = writeln!(out, "  {}", "No explores were tested.".yellow());
    }
    for tested in &result.tested {
        let name = format!("{}/{}", tested.model, tested.explore);
        if tested.passed {
            let _ = writeln!(out, "  {} {}", "✓".bright_green(), name.bright_white());
        } else {
            let _ = writeln!(out, "  {} {}", "✗".bright_red(), name.red());
        }
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}", "Errors:".bright_red().bold());
        for error in &result.errors {
            render_error(&mut out, error);
        }
    }

    let _ = writeln!(out);
    let summary = format!(
        "{} explores tested, {} failed, {} errors",
        result.tested.len(),
        result.failed_count(),
        result.errors.len()
    );
    if result.passed() {
        let _ = writeln!(out, "{} {}", "PASSED".bright_green().bold(), summary);
    } else {
        let _ = writeln!(out, "{} {}", "FAILED".bright_red().bold(), summary);
    }
    out
}
