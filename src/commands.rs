use crate::cli::ThemeArg;
use crate::ui;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::Path;
use stickies::model::{resolve_color, today, CATEGORY_PALETTE, NOTE_PALETTE};
use stickies::notebook::parse_deadline_input;
use stickies::storage::{init_project_store, locate_store};
use stickies::{FileStore, NewNote, Note, Notebook, StoreLocation, Theme};

pub type FileNotebook = Notebook<FileStore>;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_store(&cwd).context("creating project store")?;
    // Opening seeds the default categories.
    open_at(&location)?;
    println!("Initialized store at {}", location.path.display());
    Ok(())
}

pub fn list(store: Option<&Path>, category: Option<String>) -> Result<()> {
    let (mut book, location) = open_notebook(store)?;
    println!(
        "Store: {} ({})",
        location.path.display(),
        location.scope.label()
    );
    let colors = book.category_colors()?;
    let today = today();
    for section in &book.board().sections {
        if let Some(ref filter) = category {
            if &section.category != filter {
                continue;
            }
        }
        let color = colors.get(&section.category).map(String::as_str).unwrap_or("");
        println!("{} ({})", section.category, color);
        if section.notes.is_empty() {
            println!("  (empty)");
        }
        for (idx, note) in section.notes.iter().enumerate() {
            print_note(idx + 1, note, today);
        }
        println!();
    }
    if !book.board().unfiled.is_empty() {
        println!("(unfiled)");
        for (idx, note) in book.board().unfiled.iter().enumerate() {
            print_note(idx + 1, note, today);
        }
    }
    Ok(())
}

pub fn add(
    store: Option<&Path>,
    title: String,
    body: Option<String>,
    color: Option<String>,
    category: Option<String>,
    deadline: Option<String>,
) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    if let Some(ref name) = category {
        if book.board().section_index(name).is_none() {
            return Err(anyhow!("unknown category: {}", name));
        }
    }
    let deadline = match deadline {
        Some(raw) => parse_deadline_input(&raw)?,
        None => None,
    };
    let at = book.create_note(NewNote {
        title: Some(title),
        body,
        color: color.map(|c| resolve_color(&NOTE_PALETTE, &c)),
        category,
        deadline,
    })?;
    let placed = book.note(at)?;
    println!("Added note {} to {}", at.index + 1, placed.category);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    store: Option<&Path>,
    category: String,
    position: usize,
    title: Option<String>,
    body: Option<String>,
    color: Option<String>,
    deadline: Option<String>,
    clear_deadline: bool,
) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    let at = book.locate(&category, position)?;
    let deadline = match deadline {
        Some(raw) => Some(parse_deadline_input(&raw)?),
        None if clear_deadline => Some(None),
        None => None,
    };
    let color = color.map(|c| resolve_color(&NOTE_PALETTE, &c));
    book.update_note(at, |note| {
        if let Some(t) = title {
            note.title = t;
        }
        if let Some(b) = body {
            note.body = b;
        }
        if let Some(c) = color {
            note.color = c;
        }
        if let Some(d) = deadline {
            note.deadline = d;
        }
    })
    .with_context(|| format!("editing note {} in {}", position, category))?;
    println!("Updated note {} in {}", position, category);
    Ok(())
}

pub fn move_note(store: Option<&Path>, category: String, position: usize, dest: String) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    let at = book.locate(&category, position)?;
    let moved = book
        .move_note(at, &dest)
        .with_context(|| format!("moving note {} to {}", position, dest))?;
    println!("Moved note to {} at position {}", dest, moved.index + 1);
    Ok(())
}

pub fn delete(store: Option<&Path>, category: String, position: usize) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    let at = book.locate(&category, position)?;
    let removed = book.delete_note(at)?;
    println!("Deleted \"{}\" from {}", removed.title, category);
    Ok(())
}

pub fn sort(store: Option<&Path>) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    book.sort_by_deadline()?;
    println!("Sorted {} notes by deadline", book.board().len());
    Ok(())
}

pub fn clear(store: Option<&Path>) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    book.clear_notes()?;
    println!("Cleared all notes");
    Ok(())
}

pub fn category_list(store: Option<&Path>) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    for category in book.categories() {
        let color = book.category_color(&category)?;
        let count = book
            .board()
            .section_index(&category)
            .map(|idx| book.board().sections[idx].notes.len())
            .unwrap_or(0);
        println!("{}  {}  ({} notes)", category, color, count);
    }
    Ok(())
}

pub fn category_add(store: Option<&Path>, name: String, color: Option<String>) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    let color = color.map(|c| resolve_color(&CATEGORY_PALETTE, &c));
    let added = book.add_category(&name, color.as_deref())?;
    println!("Added category {}", added);
    Ok(())
}

pub fn category_remove(store: Option<&Path>, name: String) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    let replacement = book
        .delete_category(&name)
        .with_context(|| format!("removing category {}", name))?;
    println!("Removed {}; its notes moved to {}", name, replacement);
    Ok(())
}

pub fn category_color(store: Option<&Path>, name: String, color: String) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    let color = resolve_color(&CATEGORY_PALETTE, &color);
    book.set_category_color(&name, &color)?;
    println!("Set {} color to {}", name, color);
    Ok(())
}

pub fn theme(store: Option<&Path>, theme: Option<ThemeArg>) -> Result<()> {
    let (mut book, _) = open_notebook(store)?;
    if let Some(arg) = theme {
        let theme = match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        };
        book.set_theme(theme)?;
    }
    println!("Theme: {}", book.theme().label());
    Ok(())
}

pub fn tui(store: Option<&Path>) -> Result<()> {
    let (book, location) = open_notebook(store)?;
    ui::run(book, location)
}

pub fn resolve_location(store: Option<&Path>) -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    Ok(locate_store(&cwd, store)?)
}

fn open_notebook(store: Option<&Path>) -> Result<(FileNotebook, StoreLocation)> {
    let location = resolve_location(store)?;
    let book = open_at(&location)?;
    Ok((book, location))
}

fn open_at(location: &StoreLocation) -> Result<FileNotebook> {
    let store = location
        .open()
        .with_context(|| format!("opening store {}", location.path.display()))?;
    Ok(Notebook::open(store)?)
}

fn print_note(position: usize, note: &Note, today: chrono::NaiveDate) {
    println!("  {}. {}", position, note.title);
    if !note.body.is_empty() {
        println!("     {}", note.body);
    }
    if let Some(deadline) = note.deadline {
        let status = note.status_on(today);
        if status.label().is_empty() {
            println!("     deadline: {}", deadline);
        } else {
            println!("     deadline: {} ({})", deadline, status.label());
        }
    }
    println!("     color: {}", note.color);
}
