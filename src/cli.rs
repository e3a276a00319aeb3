use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stickies", version, about = "Sticky notes sorted by category and deadline")]
pub struct Cli {
    /// Store file to use instead of the discovered one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project store in the current directory
    Init,
    /// List notes grouped by category
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a new note
    Add {
        /// Title of the note
        title: String,
        /// Body text
        #[arg(long)]
        body: Option<String>,
        /// Background color (palette name or any color string)
        #[arg(long)]
        color: Option<String>,
        /// Category (defaults to the first category)
        #[arg(long)]
        category: Option<String>,
        /// Deadline in dd/mm-yyyy or yyyy-mm-dd format
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Edit a note in place
    Edit {
        /// Category holding the note
        category: String,
        /// 1-based position within the category
        position: usize,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Set deadline (dd/mm-yyyy or yyyy-mm-dd)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Move a note to another category
    Move {
        category: String,
        position: usize,
        /// Destination category
        dest: String,
    },
    /// Delete a note
    Delete { category: String, position: usize },
    /// Sort every category by deadline, undated notes last
    Sort,
    /// Delete all notes, keeping categories
    Clear,
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },
    /// Show or set the color theme
    Theme { theme: Option<ThemeArg> },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// List categories with their colors
    List,
    /// Add a category
    Add {
        name: String,
        /// Header color (palette name or any color string)
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a category; its notes move to the first other category
    Remove { name: String },
    /// Set a category color
    Color { name: String, color: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ThemeArg {
    Dark,
    Light,
}
