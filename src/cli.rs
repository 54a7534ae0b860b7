use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::domain::task::TaskStatus;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "tasksync")]
#[command(bin_name = "tasksync")]
#[command(version)]
#[command(about = "An offline task list that reconciles with Google Tasks")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        global = true,
        env = "TASKSYNC_DB_PATH",
        default_value = ".tasksync/state.sqlite",
        help = "Path to the local SQLite task store."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        global = true,
        env = "TASKSYNC_CONFIG",
        help = "Path to the TOML config file [default: .tasksync/config.toml]."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        global = true,
        action = ArgAction::Count,
        help = "Log more to stderr (-v info, -vv debug)."
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create a task offline.")]
    Add(AddArgs),
    #[command(about = "List tasks grouped by list.")]
    Ls(ListArgs),
    #[command(about = "Show open tasks that are overdue or due today.")]
    Today(JsonArgs),
    #[command(about = "Show the list names known locally.")]
    Lists(JsonArgs),
    #[command(about = "Show one task.")]
    Show(ShowArgs),
    #[command(about = "Edit task fields.")]
    Edit(EditArgs),
    #[command(about = "Mark a task completed locally.")]
    Done(IdArgs),
    #[command(about = "Delete a task from the local store.")]
    Rm(IdArgs),
    #[command(about = "Mirror remote tasks into the local store.")]
    Pull(JsonArgs),
    #[command(about = "Create local tasks remotely and adopt their remote ids.")]
    Push(JsonArgs),
    #[command(about = "Mark locally completed tasks as completed remotely.")]
    Complete(JsonArgs),
    #[command(about = "Propagate completions, pull, then push.")]
    Sync(SyncArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(help = "Task title.")]
    pub title: String,

    #[arg(short = 'l', long = "list", help = "List name (defaults to the configured list).")]
    pub list: Option<String>,

    #[arg(
        short = 'u',
        long,
        help = "Due day: today, tomorrow, YYYY-MM-DD, or RFC 3339."
    )]
    pub due: Option<String>,

    #[arg(short = 'n', long, help = "Free-form notes.")]
    pub notes: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(short = 'a', long = "all", help = "Include completed tasks.")]
    pub all: bool,

    #[arg(short = 'l', long = "list", help = "Only tasks in this list.")]
    pub list: Option<String>,

    #[arg(short = 'q', long, help = "Text query over id, title, and notes.")]
    pub query: Option<String>,

    #[arg(long = "local", help = "Only tasks not yet pushed.")]
    pub local: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Task id or its short form from `ls`.")]
    pub id: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(help = "Task id or its short form from `ls`.")]
    pub id: String,

    #[arg(short = 't', long, help = "Set title.")]
    pub title: Option<String>,

    #[arg(
        short = 'l',
        long = "list",
        help = "Move to another list (tasks not yet pushed only)."
    )]
    pub list: Option<String>,

    #[arg(short = 'u', long, help = "Set due day; an empty value clears it.")]
    pub due: Option<String>,

    #[arg(short = 'n', long, help = "Set notes; an empty value clears them.")]
    pub notes: Option<String>,

    #[arg(short = 's', long, help = "Set status: needsAction or completed.")]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Task id or its short form from `ls`.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[arg(long, help = "Do not propagate local completions first.")]
    pub skip_completions: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell name. Auto-detected from $SHELL if omitted.")]
    pub shell: Option<Shell>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
