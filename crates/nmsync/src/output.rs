//! Rendering of graph views and notifications for `--output`.
//!
//! Tables go through `tabled`; JSON and YAML serialize the engine types
//! directly; `plain` prints object paths only, one per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use nmsync_core::{Change, Notification};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Color only when asked to, or when stdout is a terminal and `NO_COLOR` is unset.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Views ────────────────────────────────────────────────────────────

/// A collection: one table row per item, or the serialized list.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// One item. The table form is the key/value block built by `detail_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// One notification as a line of `watch` output.
pub fn render_notification(
    format: OutputFormat,
    note: &Notification,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(note, true),
        OutputFormat::Yaml => render_yaml(&[note]),
        OutputFormat::Plain => Ok(format!("{} {}", note.change.label(), note.path)),
        OutputFormat::Table => {
            let label = format!("{:<32}", note.change.label());
            let label = if color {
                match note.change {
                    Change::Added => label.green().to_string(),
                    Change::Removed => label.red().to_string(),
                    Change::Updated { .. } => label.dimmed().to_string(),
                    _ => label.yellow().bold().to_string(),
                }
            } else {
                label
            };
            Ok(format!(
                "{:>6}  {label}  {:<18} {}{}",
                note.generation,
                note.kind.to_string(),
                note.path,
                change_detail(&note.change)
            ))
        }
    }
}

fn change_detail(change: &Change) -> String {
    match change {
        Change::Updated { changed } => format!("  [{}]", changed.join(", ")),
        Change::DeviceStateChanged { old, new, reason } => {
            format!("  {old} -> {new} ({reason})")
        }
        Change::ActiveConnectionStateChanged { old, new, reason } => {
            format!("  {old} -> {new} (reason {reason})")
        }
        Change::Added | Change::Removed => String::new(),
    }
}

/// Write to stdout unless `--quiet`.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Encoders ─────────────────────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nmsync_core::{DeviceState, DeviceStateReason, ObjectKind, ObjectPath};

    fn note(change: Change) -> Notification {
        Notification {
            generation: 3,
            path: ObjectPath::new("/dev/1"),
            kind: ObjectKind::Device,
            change,
        }
    }

    #[test]
    fn plain_notification_is_label_and_path() {
        let out = render_notification(OutputFormat::Plain, &note(Change::Removed), false).unwrap();
        assert_eq!(out, "removed /dev/1");
    }

    #[test]
    fn table_notification_shows_transition() {
        let out = render_notification(
            OutputFormat::Table,
            &note(Change::DeviceStateChanged {
                old: DeviceState::Prepare,
                new: DeviceState::Activated,
                reason: DeviceStateReason::NONE,
            }),
            false,
        )
        .unwrap();
        assert!(out.contains("device_state_changed"));
        assert!(out.contains("/dev/1"));
        assert!(out.contains("->"));
    }

    #[test]
    fn json_notification_is_one_line() {
        let out = render_notification(OutputFormat::Json, &note(Change::Added), false).unwrap();
        assert!(!out.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["type"], "added");
        assert_eq!(value["generation"], 3);
    }
}
