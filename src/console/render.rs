//! Plain-text rendering of views.

use std::fmt::Write;

use chrono::Weekday;

use crate::edit::RecordDetailPanel;
use crate::models::schedule::{self, ClassSlot};
use crate::models::{Entity, EntitySchema, Record, PLACEHOLDER};
use crate::views::settings::Theme;
use crate::views::{Dashboard, RecordListView};

/// Marker for a field whose shown value is staged but not saved.
pub const PENDING_MARK: &str = "*";

/// Text styling for the active theme.
pub struct Style {
    heading: (&'static str, &'static str),
    pending: (&'static str, &'static str),
    error: (&'static str, &'static str),
}

impl Style {
    pub fn for_theme(theme: Theme) -> Self {
        const RESET: &str = "\x1b[0m";
        match theme {
            Theme::Light => Self {
                heading: ("\x1b[1;34m", RESET),
                pending: ("\x1b[33m", RESET),
                error: ("\x1b[31m", RESET),
            },
            Theme::Dark => Self {
                heading: ("\x1b[1;96m", RESET),
                pending: ("\x1b[93m", RESET),
                error: ("\x1b[91m", RESET),
            },
        }
    }

    /// No escape codes; used when output is not a terminal and in tests.
    pub fn plain() -> Self {
        Self {
            heading: ("", ""),
            pending: ("", ""),
            error: ("", ""),
        }
    }

    fn paint(pair: (&str, &str), text: &str) -> String {
        format!("{}{}{}", pair.0, text, pair.1)
    }
}

fn display_name(record: &Record) -> String {
    let first = record.text("first_name").unwrap_or_default();
    let last = record.text("last_name").unwrap_or_default();
    let name = format!("{} {}", first, last).trim().to_string();
    if name.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        name
    }
}

fn list_columns(schema: &EntitySchema) -> [&'static str; 3] {
    match schema.entity {
        Entity::Students => ["student_id", "email", "program"],
        Entity::Faculty => ["faculty_id", "email", "department"],
    }
}

pub fn list(view: &RecordListView, style: &Style) -> String {
    let mut out = String::new();
    let rows = view.rows();
    let title = match view.search() {
        "" => format!("{} ({})", view.entity(), rows.len()),
        term => format!("{} matching {:?} ({})", view.entity(), term, rows.len()),
    };
    let _ = writeln!(out, "{}", Style::paint(style.heading, &title));

    if let Some(notice) = view.notice() {
        let _ = writeln!(out, "{}", Style::paint(style.error, notice));
    }
    if view.is_loading() {
        let _ = writeln!(out, "  loading...");
    }
    if rows.is_empty() && !view.is_loading() {
        let _ = writeln!(out, "  no {} to show", view.entity());
    }

    let columns = list_columns(view.schema());
    for record in rows {
        let id = record.id.map(|id| id.to_string()).unwrap_or_default();
        let cells: Vec<String> = columns
            .iter()
            .map(|field| record.text(field).unwrap_or_else(|| PLACEHOLDER.to_string()))
            .collect();
        let _ = writeln!(
            out,
            "  [{:>4}] {:<12} {:<28} {:<30} {}",
            id,
            cells[0],
            display_name(record),
            cells[1],
            cells[2]
        );
    }
    out
}

pub fn panel(panel: &RecordDetailPanel, style: &Style) -> String {
    let mut out = String::new();
    let schema = panel.schema();
    let title = match panel.record().id {
        Some(id) => format!("{} #{}: {}", schema.noun, id, display_name(panel.record())),
        None => format!("new {}", schema.noun),
    };
    let _ = writeln!(out, "{}", Style::paint(style.heading, &title));

    for spec in schema.fields {
        let shown = panel.effective(spec.name);
        let marker = if shown.pending { PENDING_MARK } else { " " };
        let value = if shown.pending {
            Style::paint(style.pending, &shown.text)
        } else {
            shown.text.clone()
        };
        let _ = write!(out, " {} {:<16} {}", marker, spec.label, value);

        if panel.is_new() && spec.required && !shown.pending {
            let _ = write!(out, "   (required)");
        }
        if let Some(editor) = panel.editor().filter(|e| e.field() == spec.name) {
            let _ = write!(out, "   [editing: {}_]", editor.value());
        }
        if let Some(error) = &shown.error {
            let _ = write!(out, "   {}", Style::paint(style.error, error));
        }
        let _ = writeln!(out);
    }

    if panel.is_saving() {
        let _ = writeln!(out, "saving...");
    } else if panel.has_unsaved_changes() {
        let _ = writeln!(
            out,
            "{} unsaved change(s) marked {}: `save` or `discard`",
            panel.pending().len(),
            PENDING_MARK
        );
    }
    if let Some(notice) = panel.notice() {
        let _ = writeln!(out, "{}", Style::paint(style.error, notice));
    }
    out
}

pub fn dashboard(dashboard: &Dashboard, style: &Style) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", Style::paint(style.heading, "dashboard"));
    for entity in Entity::ALL {
        let count = dashboard
            .count(entity)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(out, "  active {:<10} {}", entity.to_string(), count);
    }
    out
}

fn slot_line(slot: &ClassSlot) -> String {
    format!(
        "  {}-{}  {:<9} {:<32} {:<10} {}",
        slot.start.format("%H:%M"),
        slot.end.format("%H:%M"),
        slot.course_code,
        slot.title,
        slot.room,
        slot.instructor
    )
}

pub fn schedule(day: Option<Weekday>, style: &Style) -> String {
    let mut out = String::new();
    let slots = match day {
        Some(day) => schedule::for_day(day),
        None => schedule::week(),
    };
    if slots.is_empty() {
        let _ = writeln!(out, "  no classes");
        return out;
    }

    let mut current: Option<Weekday> = None;
    for slot in &slots {
        if current != Some(slot.day) {
            current = Some(slot.day);
            let _ = writeln!(out, "{}", Style::paint(style.heading, &slot.day.to_string()));
        }
        let _ = writeln!(out, "{}", slot_line(slot));
    }
    out
}
