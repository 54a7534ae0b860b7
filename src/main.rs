mod app;
mod cli;
mod completions;
mod config;
mod db;
mod domain;
mod listing;
mod logging;
mod remote;
mod store;
mod sync;
mod task_id;
mod ui;

use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        if let app::AppError::Sync(sync_err) = &err {
            if sync_err.is_retryable() {
                eprintln!("hint: the remote was unreachable; local tasks are unchanged, retry later");
            }
        }
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

fn load_config(path: Option<PathBuf>) -> Result<config::SyncConfig, app::AppError> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (PathBuf::from(config::DEFAULT_CONFIG_PATH), false),
    };
    Ok(config::SyncConfig::load(&path, explicit)?.with_env_overrides(|key| std::env::var(key).ok())?)
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell, args.install);
    }

    let config = load_config(cli.config)?;
    let app = app::App::open(&cli.db, config)?;

    match cli.command {
        Commands::Add(args) => {
            let task = app.create_task(app::NewTaskInput {
                title: args.title,
                list_name: args.list,
                due: args.due,
                notes: args.notes,
            })?;
            if args.json {
                print_json(&task);
            } else {
                let palette = ui::Palette::auto();
                println!(
                    "created {} {} [{}]",
                    palette.id(&ui::task_ref(&task)),
                    task.title,
                    task.list_name
                );
            }
        }
        Commands::Ls(args) => {
            let filter = listing::TaskListFilter {
                include_completed: args.all,
                list_name: args.list,
                query: args.query,
                local_only: args.local,
            };
            let tasks = listing::apply_filters(app.list_tasks()?, &filter);
            if args.json {
                print_json(&tasks);
            } else {
                let last_sync = app.last_sync_at()?;
                ui::print_task_list(&tasks, &filter, last_sync.as_deref());
            }
        }
        Commands::Today(args) => {
            let digest = listing::due_digest(app.list_tasks()?, listing::today_utc());
            if args.json {
                print_json(&digest);
            } else {
                ui::print_due_digest(&digest);
            }
        }
        Commands::Lists(args) => {
            let names = app.list_names()?;
            if args.json {
                print_json(&names);
            } else if names.is_empty() {
                println!("no lists yet");
            } else {
                print_lines(names);
            }
        }
        Commands::Show(args) => match app.show_task(&args.id)? {
            Some(task) => {
                if args.json {
                    print_json(&task);
                } else {
                    ui::print_task_show(&task);
                }
            }
            None => return Err(app::AppError::NotFound(args.id)),
        },
        Commands::Edit(args) => {
            let task = app.update_task(
                &args.id,
                app::TaskEdit {
                    title: args.title,
                    list_name: args.list,
                    due: args.due,
                    notes: args.notes,
                    status: args.status,
                },
            )?;
            println!(
                "updated {} [{}] {}",
                ui::task_ref(&task),
                task.status,
                task.title
            );
        }
        Commands::Done(args) => {
            let task = app.complete_task(&args.id)?;
            println!("completed {} {}", ui::task_ref(&task), task.title);
        }
        Commands::Rm(args) => {
            let task = app.delete_task(&args.id)?;
            println!("removed {} {}", ui::task_ref(&task), task.title);
        }
        Commands::Pull(args) => {
            let summary = app.pull()?;
            if args.json {
                print_json(&summary);
            } else {
                print_lines(ui::format_pull_summary(&summary));
            }
        }
        Commands::Push(args) => {
            let summary = app.push()?;
            if args.json {
                print_json(&summary);
            } else {
                print_lines(ui::format_push_summary(&summary));
            }
        }
        Commands::Complete(args) => {
            let summary = app.propagate_completions()?;
            if args.json {
                print_json(&summary);
            } else {
                print_lines(ui::format_completion_summary(&summary));
            }
        }
        Commands::Sync(args) => {
            let report = app.sync(args.skip_completions)?;
            if args.json {
                print_json(&report);
            } else {
                if let Some(completions) = report.completions.as_ref() {
                    print_lines(ui::format_completion_summary(completions));
                }
                print_lines(ui::format_pull_summary(&report.pull));
                print_lines(ui::format_push_summary(&report.push));
            }
        }
        Commands::Completions(_) => unreachable!("completions return before app init"),
    }

    Ok(())
}
