mod cli;
mod commands;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STICKIES_LOG";

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    let store = args.store.as_deref();
    init_logging(&command, store)?;
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::List { category } => commands::list(store, category),
        cli::Command::Add {
            title,
            body,
            color,
            category,
            deadline,
        } => commands::add(store, title, body, color, category, deadline),
        cli::Command::Edit {
            category,
            position,
            title,
            body,
            color,
            deadline,
            clear_deadline,
        } => commands::edit(
            store,
            category,
            position,
            title,
            body,
            color,
            deadline,
            clear_deadline,
        ),
        cli::Command::Move {
            category,
            position,
            dest,
        } => commands::move_note(store, category, position, dest),
        cli::Command::Delete { category, position } => commands::delete(store, category, position),
        cli::Command::Sort => commands::sort(store),
        cli::Command::Clear => commands::clear(store),
        cli::Command::Category { action } => match action {
            cli::CategoryCommand::List => commands::category_list(store),
            cli::CategoryCommand::Add { name, color } => commands::category_add(store, name, color),
            cli::CategoryCommand::Remove { name } => commands::category_remove(store, name),
            cli::CategoryCommand::Color { name, color } => {
                commands::category_color(store, name, color)
            }
        },
        cli::Command::Theme { theme } => commands::theme(store, theme),
        cli::Command::Tui => commands::tui(store),
    }
}

/// CLI commands log to stderr. The TUI owns the terminal, so it logs to a
/// file beside the store instead.
fn init_logging(command: &cli::Command, store: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if matches!(command, cli::Command::Tui) {
        let log_path = commands::resolve_location(store)?.log_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("opening log file {}", log_path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}
