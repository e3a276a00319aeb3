use crate::board::{Board, NoteRef, Slot};
use crate::model::{
    Deadline, Note, ParseDeadlineError, Theme, CATEGORY_PALETTE, DEFAULT_CATEGORY_COLOR,
};
use crate::registry::{CategoryRegistry, RegistryError};
use crate::storage::{KeyValueStore, StoreError, DARK_MODE_KEY, NOTES_KEY};
use std::collections::BTreeMap;

#[derive(thiserror::Error, Debug)]
pub enum NotebookError {
    #[error("cannot delete the only remaining category")]
    LastCategory,
    #[error("no note at position {position} in {container}")]
    NoteNotFound { container: String, position: usize },
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Deadline(#[from] ParseDeadlineError),
}

/// Fields for a note about to be created. Unset fields take the note
/// defaults, as does a blank title; an unset category means the first
/// category.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: Option<String>,
    pub body: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<Deadline>,
}

/// Owns the store and the live board. Every mutating method applies one
/// user action and then writes the full snapshot.
pub struct Notebook<S: KeyValueStore> {
    store: S,
    board: Board,
    theme: Theme,
}

impl<S: KeyValueStore> Notebook<S> {
    pub fn open(mut store: S) -> Result<Self, NotebookError> {
        let categories = CategoryRegistry::new(&mut store).list()?;
        let board = Board::load(&store, &categories)?;
        let theme = Theme::from_stored(store.read(DARK_MODE_KEY)?.as_deref());
        tracing::info!(
            categories = categories.len(),
            notes = board.len(),
            "opened notebook"
        );
        Ok(Notebook {
            store,
            board,
            theme,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn categories(&self) -> Vec<String> {
        self.board
            .sections
            .iter()
            .map(|s| s.category.clone())
            .collect()
    }

    pub fn category_color(&mut self, name: &str) -> Result<String, NotebookError> {
        Ok(self.registry().color_of(name)?)
    }

    pub fn category_colors(&mut self) -> Result<BTreeMap<String, String>, NotebookError> {
        let colors = self.registry().colors()?;
        Ok(self
            .categories()
            .into_iter()
            .map(|name| {
                let color = colors
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
                (name, color)
            })
            .collect())
    }

    /// Resolves a category name and 1-based position to a note reference.
    pub fn locate(&self, category: &str, position: usize) -> Result<NoteRef, NotebookError> {
        let slot = self
            .board
            .section_index(category)
            .map(Slot::Section)
            .ok_or_else(|| NotebookError::CategoryNotFound(category.to_string()))?;
        let at = NoteRef::new(slot, position.saturating_sub(1));
        if position == 0 || self.board.get(at).is_none() {
            return Err(NotebookError::NoteNotFound {
                container: category.to_string(),
                position,
            });
        }
        Ok(at)
    }

    pub fn note(&self, at: NoteRef) -> Result<&Note, NotebookError> {
        self.board.get(at).ok_or_else(|| self.not_found(at))
    }

    pub fn create_note(&mut self, new: NewNote) -> Result<NoteRef, NotebookError> {
        let category = new
            .category
            .or_else(|| self.categories().into_iter().next())
            .unwrap_or_default();
        let mut note = Note::new(category);
        if let Some(title) = new.title.filter(|t| !t.trim().is_empty()) {
            note.title = title.trim().to_string();
        }
        if let Some(body) = new.body {
            note.body = body;
        }
        if let Some(color) = new.color {
            note.color = color;
        }
        note.deadline = new.deadline;
        let at = self.board.place(note);
        self.save()?;
        tracing::info!(?at, "created note");
        Ok(at)
    }

    pub fn update_note<F>(&mut self, at: NoteRef, f: F) -> Result<(), NotebookError>
    where
        F: FnOnce(&mut Note),
    {
        let not_found = self.not_found(at);
        let note = self.board.get_mut(at).ok_or(not_found)?;
        f(note);
        self.save()
    }

    pub fn set_note_color(&mut self, at: NoteRef, color: &str) -> Result<(), NotebookError> {
        self.update_note(at, |note| note.color = color.to_string())
    }

    pub fn set_deadline(
        &mut self,
        at: NoteRef,
        deadline: Option<Deadline>,
    ) -> Result<(), NotebookError> {
        self.update_note(at, |note| note.deadline = deadline)
    }

    /// Sets the deadline from user input; blank input clears it. Input
    /// that does not parse is rejected and leaves the note unchanged.
    pub fn set_deadline_input(&mut self, at: NoteRef, input: &str) -> Result<(), NotebookError> {
        let deadline = parse_deadline_input(input)?;
        self.set_deadline(at, deadline)
    }

    pub fn delete_note(&mut self, at: NoteRef) -> Result<Note, NotebookError> {
        let not_found = self.not_found(at);
        let note = self.board.take(at).ok_or(not_found)?;
        self.save()?;
        tracing::info!(?at, "deleted note");
        Ok(note)
    }

    pub fn move_note(&mut self, at: NoteRef, category: &str) -> Result<NoteRef, NotebookError> {
        if self.board.section_index(category).is_none() {
            return Err(NotebookError::CategoryNotFound(category.to_string()));
        }
        let not_found = self.not_found(at);
        let moved = self.board.move_to(at, category).ok_or(not_found)?;
        self.save()?;
        tracing::info!(from = ?at, to = ?moved, "moved note");
        Ok(moved)
    }

    pub fn shift_note(&mut self, at: NoteRef, delta: isize) -> Result<NoteRef, NotebookError> {
        let not_found = self.not_found(at);
        let shifted = self.board.shift(at, delta).ok_or(not_found)?;
        self.save()?;
        Ok(shifted)
    }

    pub fn sort_by_deadline(&mut self) -> Result<(), NotebookError> {
        self.board.sort_by_deadline();
        self.save()?;
        tracing::info!("sorted notes by deadline");
        Ok(())
    }

    /// Removes every note but keeps the categories.
    pub fn clear_notes(&mut self) -> Result<(), NotebookError> {
        self.board.clear_notes();
        self.store.remove(NOTES_KEY)?;
        tracing::info!("cleared all notes");
        Ok(())
    }

    pub fn add_category(
        &mut self,
        name: &str,
        color: Option<&str>,
    ) -> Result<String, NotebookError> {
        let mut registry = self.registry();
        let name = registry.add(name)?;
        registry.set_color(&name, color.unwrap_or(CATEGORY_PALETTE[0].1))?;
        self.board.add_section(name.clone());
        self.save()?;
        tracing::info!(category = %name, "added category");
        Ok(name)
    }

    /// Deletes `name`, moving its notes to the first other category.
    /// Returns that replacement.
    pub fn delete_category(&mut self, name: &str) -> Result<String, NotebookError> {
        let categories = self.registry().list()?;
        if !categories.iter().any(|c| c == name) {
            return Err(RegistryError::NotFound(name.to_string()).into());
        }
        if categories.len() <= 1 {
            return Err(NotebookError::LastCategory);
        }
        let replacement = categories
            .iter()
            .find(|c| c.as_str() != name)
            .cloned()
            .ok_or(NotebookError::LastCategory)?;

        if let (Some(from), Some(to)) = (
            self.board.section_index(name),
            self.board.section_index(&replacement),
        ) {
            self.board.merge_section(from, to);
        }
        self.registry().remove(name, &replacement)?;
        self.save()?;
        tracing::info!(category = %name, replacement = %replacement, "deleted category");
        Ok(replacement)
    }

    pub fn set_category_color(&mut self, name: &str, color: &str) -> Result<(), NotebookError> {
        if self.board.section_index(name).is_none() {
            return Err(NotebookError::CategoryNotFound(name.to_string()));
        }
        self.registry().set_color(name, color)?;
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), NotebookError> {
        self.store.write(DARK_MODE_KEY, theme.stored_value())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, NotebookError> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    fn registry(&mut self) -> CategoryRegistry<'_, S> {
        CategoryRegistry::new(&mut self.store)
    }

    fn save(&mut self) -> Result<(), NotebookError> {
        self.board.save(&mut self.store)?;
        Ok(())
    }

    fn not_found(&self, at: NoteRef) -> NotebookError {
        let container = match at.slot {
            Slot::Section(idx) => self
                .board
                .sections
                .get(idx)
                .map(|s| s.category.clone())
                .unwrap_or_else(|| format!("section {}", idx)),
            Slot::Unfiled => "unfiled".to_string(),
        };
        NotebookError::NoteNotFound {
            container,
            position: at.index + 1,
        }
    }
}

pub fn parse_deadline_input(input: &str) -> Result<Option<Deadline>, ParseDeadlineError> {
    if input.trim().is_empty() {
        Ok(None)
    } else {
        Deadline::parse_input(input).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::serialize_all;
    use crate::storage::{load_json, save_json, MemoryStore, CATEGORIES_KEY};
    use pretty_assertions::assert_eq;

    fn titled(title: &str, category: &str) -> NewNote {
        NewNote {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            ..NewNote::default()
        }
    }

    #[test]
    fn open_seeds_four_sections() {
        let book = Notebook::open(MemoryStore::new()).unwrap();
        assert_eq!(book.categories(), vec!["Work", "Personal", "Ideas", "Tasks"]);
        assert!(book.board().is_empty());
    }

    #[test]
    fn created_notes_survive_reopen() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        book.create_note(titled("ship it", "Work")).unwrap();
        let at = book.create_note(titled("read", "Ideas")).unwrap();
        book.set_deadline(at, Some("05/11-2026".parse().unwrap()))
            .unwrap();
        let before = serialize_all(book.board());

        let reopened = Notebook::open(book.into_store()).unwrap();
        assert_eq!(serialize_all(reopened.board()), before);
    }

    #[test]
    fn deleting_category_reassigns_to_replacement() {
        let mut store = MemoryStore::new();
        save_json(&mut store, CATEGORIES_KEY, &["A", "B"]).unwrap();
        let mut book = Notebook::open(store).unwrap();
        book.create_note(titled("n", "A")).unwrap();

        let replacement = book.delete_category("A").unwrap();

        assert_eq!(replacement, "B");
        assert_eq!(book.categories(), vec!["B"]);
        let at = book.locate("B", 1).unwrap();
        assert_eq!(book.note(at).unwrap().category, "B");
        let stored: Vec<String> = load_json(book.store(), CATEGORIES_KEY).unwrap().unwrap();
        assert_eq!(stored, vec!["B"]);
    }

    #[test]
    fn last_category_cannot_be_deleted() {
        let mut store = MemoryStore::new();
        save_json(&mut store, CATEGORIES_KEY, &["Only"]).unwrap();
        let mut book = Notebook::open(store).unwrap();
        assert!(matches!(
            book.delete_category("Only"),
            Err(NotebookError::LastCategory)
        ));
        assert_eq!(book.categories(), vec!["Only"]);
    }

    #[test]
    fn move_note_sticks_after_reopen() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        let at = book.create_note(titled("drift", "Work")).unwrap();
        book.move_note(at, "Tasks").unwrap();

        let reopened = Notebook::open(book.into_store()).unwrap();
        let at = reopened.locate("Tasks", 1).unwrap();
        assert_eq!(reopened.note(at).unwrap().title, "drift");
        assert!(reopened.locate("Work", 1).is_err());
    }

    #[test]
    fn add_category_uses_first_palette_color() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        let name = book.add_category(" Errands ", None).unwrap();
        assert_eq!(name, "Errands");
        assert_eq!(book.category_color("Errands").unwrap(), "#00bfff");
        assert!(matches!(
            book.add_category("Work", None),
            Err(NotebookError::Registry(RegistryError::DuplicateName(_)))
        ));
    }

    #[test]
    fn clear_keeps_categories() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        book.create_note(titled("x", "Work")).unwrap();
        book.clear_notes().unwrap();
        let reopened = Notebook::open(book.into_store()).unwrap();
        assert!(reopened.board().is_empty());
        assert_eq!(reopened.categories().len(), 4);
    }

    #[test]
    fn bad_deadline_input_leaves_note_untouched() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        let at = book.create_note(titled("x", "Work")).unwrap();
        book.set_deadline_input(at, "2026-12-24").unwrap();
        assert!(matches!(
            book.set_deadline_input(at, "24.12.2026"),
            Err(NotebookError::Deadline(_))
        ));
        let deadline = book.note(at).unwrap().deadline.map(|d| d.to_string());
        assert_eq!(deadline.as_deref(), Some("24/12-2026"));
        book.set_deadline_input(at, "  ").unwrap();
        assert_eq!(book.note(at).unwrap().deadline, None);
    }

    #[test]
    fn theme_is_persisted() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        assert_eq!(book.theme(), Theme::Light);
        assert_eq!(book.toggle_theme().unwrap(), Theme::Dark);
        let reopened = Notebook::open(book.into_store()).unwrap();
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn locate_rejects_position_zero_and_overflow() {
        let mut book = Notebook::open(MemoryStore::new()).unwrap();
        book.create_note(titled("x", "Work")).unwrap();
        assert!(book.locate("Work", 1).is_ok());
        assert!(matches!(
            book.locate("Work", 0),
            Err(NotebookError::NoteNotFound { .. })
        ));
        assert!(matches!(
            book.locate("Work", 2),
            Err(NotebookError::NoteNotFound { .. })
        ));
        assert!(matches!(
            book.locate("Nope", 1),
            Err(NotebookError::CategoryNotFound(_))
        ));
    }
}
