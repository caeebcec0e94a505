use quicktask_core::config::Palette;
use quicktask_core::model::{Schedule, StoredTask};
use quicktask_core::view::ViewRow;
use quicktask_core::{Snapshot, Status};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::macros::format_description;

pub const HELP_TEXT: &str = "\
Commands:
  add <name> [on|by <date> | from <date> to <date>] [#tag]... [!|!!]
  del <index|name|#tag>
  done <index|name>
  set <index|name> [\"new name\"] [[date | start, end | none]] [!|!!]
  view <all|general|deadlines|events|archive|expired|week|today|tomorrow|low|medium|high|#tag...>
  search <phrase>
  undo | save | clear

Dates: today, tomorrow, next fri, 31 dec, 31 dec 2026, 31 dec 3pm, 31 dec 2026 15:30
Indices refer to the list shown last.
Type exit or quit to leave.";

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "State")]
    state: &'static str,
}

fn format_instant(instant: OffsetDateTime, now: OffsetDateTime) -> String {
    instant
        .to_offset(now.offset())
        .format(format_description!(
            "[day] [month repr:short] [year] [hour]:[minute]"
        ))
        .unwrap_or_else(|_| instant.to_string())
}

fn describe_schedule(schedule: &Schedule, now: OffsetDateTime) -> String {
    match *schedule {
        Schedule::Floating => "-".to_string(),
        Schedule::Deadline { due } => format!("by {}", format_instant(due, now)),
        Schedule::Event { start, end } => format!(
            "{} - {}",
            format_instant(start, now),
            format_instant(end, now)
        ),
    }
}

fn state_label(stored: &StoredTask, now: OffsetDateTime) -> &'static str {
    if stored.task.completed {
        "done"
    } else if stored.task.is_expired(now) {
        "(expired)"
    } else {
        "pending"
    }
}

fn tag_list(stored: &StoredTask) -> String {
    stored
        .task
        .tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_table(rows: &[ViewRow], now: OffsetDateTime) -> String {
    if rows.is_empty() {
        return "(no tasks)".to_string();
    }

    let rows = rows.iter().map(|ViewRow { index, stored }| TaskRow {
        index: *index,
        name: stored.task.name.clone(),
        kind: stored.task.kind().label(),
        when: describe_schedule(&stored.task.schedule, now),
        priority: stored.task.priority.label(),
        tags: tag_list(stored),
        state: state_label(stored, now),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn render_plain(status: &Status, snapshot: &Snapshot, palette: &Palette) -> String {
    match status {
        Status::Help => HELP_TEXT.to_string(),
        Status::Viewed(_) | Status::Searched { .. } => format!(
            "{}\n{}",
            palette.heading(&format!("[{}]", snapshot.view_title)),
            render_table(&snapshot.view, snapshot.now)
        ),
        Status::AddedExpired(_) | Status::UpdatedExpired(_) => palette.expired(&status.message()),
        other => other.message(),
    }
}

pub fn render_json(status: &Status, snapshot: &Snapshot) -> serde_json::Value {
    let tasks: Vec<serde_json::Value> = snapshot
        .view
        .iter()
        .map(|ViewRow { index, stored }| {
            serde_json::json!({
                "index": index,
                "id": stored.id,
                "name": stored.task.name,
                "type": stored.task.kind().label(),
                "schedule": stored.task.schedule,
                "priority": stored.task.priority,
                "tags": stored.task.tags,
                "completed": stored.task.completed,
                "expired": stored.task.is_expired(snapshot.now),
            })
        })
        .collect();

    serde_json::json!({
        "status": status.code(),
        "message": status.message(),
        "view": snapshot.view_title,
        "tasks": tasks,
        "tags": snapshot.tags,
    })
}
