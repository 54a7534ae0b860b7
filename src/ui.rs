use std::io::{self, IsTerminal};

use crate::domain::task::{TaskRecord, TaskStatus};
use crate::listing::{due_date, DueDigest, TaskListFilter};
use crate::sync::{CompletionSummary, ItemFailure, PullSummary, PushSummary};
use crate::task_id::display_id;

pub fn print_task_list(tasks: &[TaskRecord], filter: &TaskListFilter, last_sync: Option<&str>) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Tasks"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }

    if tasks.is_empty() {
        println!("{}", palette.dim("no tasks matched"));
    } else {
        let mut current_list: Option<&str> = None;
        for task in tasks {
            if current_list != Some(task.list_name.as_str()) {
                current_list = Some(task.list_name.as_str());
                println!("{}", palette.list_name(&task.list_name));
            }
            println!("  {}", format_task_row(task, &palette));
        }
        println!("{}", palette.dim(&format!("{} task(s)", tasks.len())));
    }

    match last_sync {
        Some(at) => println!("{}", palette.dim(&format!("last sync: {at}"))),
        None => println!("{}", palette.dim("never synced")),
    }
}

pub fn print_task_show(task: &TaskRecord) {
    let palette = Palette::auto();
    println!("{} {}", palette.id(&task.id), palette.status(task.status));
    println!("title: {}", task.title);
    println!("list:  {}", task.list_name);
    if let Some(due) = task.due_time.as_deref() {
        println!("due:   {}", due_label(due));
    }
    if let Some(notes) = task.notes.as_deref() {
        println!("notes: {}", notes);
    }
    if task.is_local_origin() {
        println!("{}", palette.dim("not yet pushed"));
    }
}

pub fn print_due_digest(digest: &DueDigest) {
    let palette = Palette::auto();
    if digest.is_empty() {
        println!("{}", palette.dim("nothing due today"));
        return;
    }
    for task in &digest.overdue {
        println!("{} {}", palette.overdue("[OVERDUE]"), format_digest_row(task, &palette));
    }
    for task in &digest.today {
        println!("{} {}", palette.today("[TODAY]"), format_digest_row(task, &palette));
    }
}

pub fn task_ref(task: &TaskRecord) -> String {
    display_id(&task.id).to_string()
}

fn format_task_row(task: &TaskRecord, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(display_id(&task.id)),
        palette.status(task.status),
        task.title
    );
    if let Some(due) = task.due_time.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("due {}", due_label(due))));
    }
    if task.is_local_origin() {
        line.push(' ');
        line.push_str(&palette.local_marker("(local)"));
    }
    line
}

fn format_digest_row(task: &TaskRecord, palette: &Palette) -> String {
    format!(
        "{} {} {}",
        palette.id(display_id(&task.id)),
        task.title,
        palette.dim(&format!("({})", task.list_name))
    )
}

fn due_label(due: &str) -> String {
    due_date(due)
        .map(|day| day.to_string())
        .unwrap_or_else(|| due.to_string())
}

fn filter_summary(filter: &TaskListFilter) -> Option<String> {
    let mut parts = Vec::new();
    if filter.include_completed {
        parts.push("all=true".to_string());
    }
    if filter.local_only {
        parts.push("local=true".to_string());
    }
    if let Some(list) = filter.list_name.as_deref().and_then(non_empty) {
        parts.push(format!("list={list}"));
    }
    if let Some(query) = filter.query.as_deref().and_then(non_empty) {
        parts.push(format!("query={query}"));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

pub fn format_pull_summary(summary: &PullSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "pull status={} lists={} pulled={} skipped_lists={}",
        summary.status.as_str(),
        summary.lists_seen,
        summary.pulled,
        summary.skipped_lists.len()
    )];
    for list in &summary.skipped_lists {
        lines.push(format!("  - list {} ({}): {}", list.title, list.list_id, list.message));
    }
    lines.extend(summary.failures.iter().map(failure_line));
    lines
}

pub fn format_push_summary(summary: &PushSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "push status={} attempted={} pushed={} failed={}",
        summary.status.as_str(),
        summary.attempted,
        summary.pushed.len(),
        summary.failures.len()
    )];
    for pushed in &summary.pushed {
        lines.push(format!(
            "  + {} -> {} {} [{}]",
            pushed.local_id, pushed.remote_id, pushed.title, pushed.list_name
        ));
    }
    lines.extend(summary.failures.iter().map(failure_line));
    lines
}

pub fn format_completion_summary(summary: &CompletionSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "complete status={} attempted={} updated={} failed={}",
        summary.status.as_str(),
        summary.attempted,
        summary.updated.len(),
        summary.failures.len()
    )];
    lines.extend(summary.failures.iter().map(failure_line));
    lines
}

fn failure_line(failure: &ItemFailure) -> String {
    format!("  - {} {}: {}", failure.id, failure.title, failure.message)
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn list_name(&self, text: &str) -> String {
        self.paint("1;35", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    pub fn status(&self, status: TaskStatus) -> String {
        let (code, label) = match status {
            TaskStatus::NeedsAction => ("33", "[ ]"),
            TaskStatus::Completed => ("32", "[x]"),
        };
        self.paint(code, label)
    }

    fn local_marker(&self, text: &str) -> String {
        self.paint("90", text)
    }

    fn overdue(&self, text: &str) -> String {
        self.paint("1;31", text)
    }

    fn today(&self, text: &str) -> String {
        self.paint("1;33", text)
    }
}
