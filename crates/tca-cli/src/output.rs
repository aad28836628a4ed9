// Output format auto-detection and rendering for the CLI.
//
// TTY → human-readable text. Piped/redirected → JSON.
// `--json` forces JSON output regardless of terminal.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use serde_json::Value;
use tca_client::{ClientError, LoginError, Record};

use crate::commands::SessionRequired;

const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Widest a table cell may grow before it is truncated
const MAX_CELL_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty { Self::Human } else { Self::Json }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => writeln!(writer, "{}", human_fn(value)),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Report a failed command on stderr.
pub fn print_anyhow_error(format: OutputFormat, err: &anyhow::Error) {
    let (code, message) = describe_error(err);
    let mut out = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let _ = if io::stderr().is_terminal() {
                writeln!(out, "{ANSI_RED}error{ANSI_RESET}: {message}")
            } else {
                writeln!(out, "error: {message}")
            };
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            let _ = serde_json::to_writer(&mut out, &obj);
            let _ = writeln!(out);
        }
    }
}

/// Stable error code and user-facing message for an error chain.
pub fn describe_error(err: &anyhow::Error) -> (&'static str, String) {
    for cause in err.chain() {
        if cause.downcast_ref::<SessionRequired>().is_some() {
            return ("NOT_LOGGED_IN", "not logged in; run `tca login` first".to_string());
        }
        if let Some(client_err) = cause.downcast_ref::<ClientError>() {
            if client_err.is_auth_expired() {
                return (
                    "SESSION_EXPIRED",
                    "session expired; run `tca login` to sign in again".to_string(),
                );
            }
            if client_err.is_transport() {
                return (
                    "BACKEND_UNREACHABLE",
                    format!("backend unreachable: {}", client_err.message()),
                );
            }
            return ("REQUEST_FAILED", client_err.message());
        }
        if let Some(login_err) = cause.downcast_ref::<LoginError>() {
            let code = match login_err {
                LoginError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
                LoginError::ServerUnreachable(_) => "BACKEND_UNREACHABLE",
                LoginError::Other(_) => "LOGIN_FAILED",
            };
            return (code, login_err.to_string());
        }
    }
    ("ERROR", format!("{err:#}"))
}

// ============== Tables ==============

/// Render flat records as an aligned text table. Columns follow the key order
/// of the first record; keys first seen later are appended.
pub fn render_records(records: &[Record]) -> String {
    if records.is_empty() {
        return "(no records)".to_string();
    }

    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| truncate(&cell_text(record.get(*col))))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(join_padded(columns.iter().map(|c| c.to_string()), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(join_padded(row.into_iter(), &widths));
    }
    lines.join("\n")
}

fn join_padded(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}
