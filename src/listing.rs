use std::error::Error;
use std::fmt;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::domain::task::TaskRecord;
use crate::task_id::{origin_of, TaskOrigin};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListFilter {
    pub include_completed: bool,
    pub list_name: Option<String>,
    pub query: Option<String>,
    pub local_only: bool,
}

pub fn apply_filters(tasks: Vec<TaskRecord>, filter: &TaskListFilter) -> Vec<TaskRecord> {
    let normalized = NormalizedFilter::from(filter);
    if normalized.is_pass_through() {
        return tasks;
    }

    tasks
        .into_iter()
        .filter(|task| matches_filter(task, &normalized))
        .collect()
}

#[derive(Debug, Clone, Default)]
struct NormalizedFilter {
    include_completed: bool,
    list_name: Option<String>,
    query: Option<String>,
    local_only: bool,
}

impl NormalizedFilter {
    fn is_pass_through(&self) -> bool {
        self.include_completed
            && self.list_name.is_none()
            && self.query.is_none()
            && !self.local_only
    }
}

impl From<&TaskListFilter> for NormalizedFilter {
    fn from(value: &TaskListFilter) -> Self {
        Self {
            include_completed: value.include_completed,
            list_name: normalize_scalar(value.list_name.as_deref()),
            query: normalize_scalar(value.query.as_deref()),
            local_only: value.local_only,
        }
    }
}

fn matches_filter(task: &TaskRecord, filter: &NormalizedFilter) -> bool {
    if !filter.include_completed && task.status.is_completed() {
        return false;
    }
    if filter.local_only && origin_of(&task.id) != TaskOrigin::Local {
        return false;
    }
    if let Some(expected) = filter.list_name.as_deref() {
        if task.list_name.trim().to_ascii_lowercase() != expected {
            return false;
        }
    }
    if let Some(query) = filter.query.as_deref() {
        return matches_query(task, query);
    }
    true
}

fn matches_query(task: &TaskRecord, query: &str) -> bool {
    let notes = task.notes.as_deref().unwrap_or("").to_ascii_lowercase();
    task.id.to_ascii_lowercase().contains(query)
        || task.title.to_ascii_lowercase().contains(query)
        || notes.contains(query)
}

fn normalize_scalar(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueClass {
    Overdue,
    Today,
    Upcoming,
    Unscheduled,
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Calendar day of a stored due time. The remote keeps only the date part,
/// stamped at midnight UTC.
pub fn due_date(due_time: &str) -> Option<Date> {
    let raw = due_time.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed.to_offset(UtcOffset::UTC).date());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

pub fn classify_due(task: &TaskRecord, today: Date) -> DueClass {
    match task.due_time.as_deref().and_then(due_date) {
        None => DueClass::Unscheduled,
        Some(day) if day < today => DueClass::Overdue,
        Some(day) if day == today => DueClass::Today,
        Some(_) => DueClass::Upcoming,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DueDigest {
    pub overdue: Vec<TaskRecord>,
    pub today: Vec<TaskRecord>,
}

impl DueDigest {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.today.is_empty()
    }
}

/// Open tasks due today or earlier.
pub fn due_digest(tasks: Vec<TaskRecord>, today: Date) -> DueDigest {
    let mut digest = DueDigest::default();
    for task in tasks {
        if task.status.is_completed() {
            continue;
        }
        match classify_due(&task, today) {
            DueClass::Overdue => digest.overdue.push(task),
            DueClass::Today => digest.today.push(task),
            DueClass::Upcoming | DueClass::Unscheduled => {}
        }
    }
    digest
}

/// Turns user input (`today`, `tomorrow`, `YYYY-MM-DD`, or RFC 3339) into
/// the stored due format.
pub fn normalize_due(raw: &str, today: Date) -> Result<String, InvalidDue> {
    let trimmed = raw.trim();
    let day = match trimmed.to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.next_day(),
        _ => due_date(trimmed),
    };
    day.map(format_due).ok_or_else(|| InvalidDue {
        value: raw.to_string(),
    })
}

fn format_due(day: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}T00:00:00.000Z",
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDue {
    value: String,
}

impl fmt::Display for InvalidDue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid due date '{}': use today, tomorrow, YYYY-MM-DD or RFC 3339",
            self.value
        )
    }
}

impl Error for InvalidDue {}
