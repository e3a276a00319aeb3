use crate::model::{Note, NoteRecord};
use crate::storage::{load_json, save_json, KeyValueStore, StoreError, NOTES_KEY};
use std::cmp::Ordering;

/// Where a note lives: a category section by index, or the unfiled
/// container used when no sections exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Section(usize),
    Unfiled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRef {
    pub slot: Slot,
    pub index: usize,
}

impl NoteRef {
    pub fn new(slot: Slot, index: usize) -> Self {
        NoteRef { slot, index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub category: String,
    pub notes: Vec<Note>,
}

/// The live note set. Sections follow registry order and hold their notes
/// in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub sections: Vec<Section>,
    pub unfiled: Vec<Note>,
}

impl Board {
    pub fn with_categories<I, T>(categories: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Board {
            sections: categories
                .into_iter()
                .map(|c| Section {
                    category: c.into(),
                    notes: Vec::new(),
                })
                .collect(),
            unfiled: Vec::new(),
        }
    }

    /// Rebuilds the board from the stored snapshot. Records with a blank
    /// category go to the first category.
    pub fn load<S>(store: &S, categories: &[String]) -> Result<Self, StoreError>
    where
        S: KeyValueStore + ?Sized,
    {
        let mut board = Board::with_categories(categories.iter().cloned());
        let records: Vec<NoteRecord> = load_json(store, NOTES_KEY)?.unwrap_or_default();
        for record in records {
            let mut note = Note::from_record(record);
            if note.category.trim().is_empty() {
                if let Some(first) = categories.first() {
                    note.category = first.clone();
                }
            }
            board.place(note);
        }
        Ok(board)
    }

    pub fn save<S>(&self, store: &mut S) -> Result<(), StoreError>
    where
        S: KeyValueStore + ?Sized,
    {
        let records = serialize_all(self);
        save_json(store, NOTES_KEY, &records)?;
        tracing::debug!(notes = records.len(), "saved snapshot");
        Ok(())
    }

    pub fn section_index(&self, category: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.category == category)
    }

    /// Appends `note` to the section for its category, falling back to the
    /// first section and then to the unfiled container.
    pub fn place(&mut self, mut note: Note) -> NoteRef {
        let idx = match self.section_index(&note.category) {
            Some(idx) => idx,
            None if !self.sections.is_empty() => {
                tracing::warn!(
                    "category {:?} has no section; placing note in {:?}",
                    note.category,
                    self.sections[0].category
                );
                0
            }
            None => {
                self.unfiled.push(note);
                return NoteRef::new(Slot::Unfiled, self.unfiled.len() - 1);
            }
        };
        let section = &mut self.sections[idx];
        note.category = section.category.clone();
        section.notes.push(note);
        NoteRef::new(Slot::Section(idx), section.notes.len() - 1)
    }

    pub fn notes_in(&self, slot: Slot) -> Option<&[Note]> {
        match slot {
            Slot::Section(idx) => self.sections.get(idx).map(|s| s.notes.as_slice()),
            Slot::Unfiled => Some(self.unfiled.as_slice()),
        }
    }

    fn notes_in_mut(&mut self, slot: Slot) -> Option<&mut Vec<Note>> {
        match slot {
            Slot::Section(idx) => self.sections.get_mut(idx).map(|s| &mut s.notes),
            Slot::Unfiled => Some(&mut self.unfiled),
        }
    }

    pub fn get(&self, at: NoteRef) -> Option<&Note> {
        self.notes_in(at.slot).and_then(|notes| notes.get(at.index))
    }

    pub fn get_mut(&mut self, at: NoteRef) -> Option<&mut Note> {
        self.notes_in_mut(at.slot)
            .and_then(|notes| notes.get_mut(at.index))
    }

    pub fn take(&mut self, at: NoteRef) -> Option<Note> {
        let notes = self.notes_in_mut(at.slot)?;
        if at.index < notes.len() {
            Some(notes.remove(at.index))
        } else {
            None
        }
    }

    /// Re-parents a note into `category`, appending it at the end. Returns
    /// the new position, or `None` when `at` or `category` is unknown.
    pub fn move_to(&mut self, at: NoteRef, category: &str) -> Option<NoteRef> {
        let dest = self.section_index(category)?;
        if at.slot == Slot::Section(dest) {
            self.get(at)?;
            return Some(at);
        }
        let mut note = self.take(at)?;
        note.category = category.to_string();
        let section = &mut self.sections[dest];
        section.notes.push(note);
        Some(NoteRef::new(Slot::Section(dest), section.notes.len() - 1))
    }

    /// Swaps a note with its neighbour inside the same container.
    pub fn shift(&mut self, at: NoteRef, delta: isize) -> Option<NoteRef> {
        let notes = self.notes_in_mut(at.slot)?;
        if at.index >= notes.len() {
            return None;
        }
        let max = notes.len() as isize - 1;
        let target = (at.index as isize + delta).clamp(0, max) as usize;
        notes.swap(at.index, target);
        Some(NoteRef::new(at.slot, target))
    }

    /// Moves every note of section `from` to the end of section `to` and
    /// drops section `from`.
    pub fn merge_section(&mut self, from: usize, to: usize) -> Option<()> {
        if from == to || from >= self.sections.len() || to >= self.sections.len() {
            return None;
        }
        let removed = self.sections.remove(from);
        let to = if to > from { to - 1 } else { to };
        let target = &mut self.sections[to];
        for mut note in removed.notes {
            note.category = target.category.clone();
            target.notes.push(note);
        }
        Some(())
    }

    pub fn add_section(&mut self, category: impl Into<String>) -> usize {
        let category = category.into();
        if let Some(idx) = self.section_index(&category) {
            return idx;
        }
        self.sections.push(Section {
            category,
            notes: Vec::new(),
        });
        let idx = self.sections.len() - 1;
        // Unfiled notes only exist while there are no sections.
        for note in std::mem::take(&mut self.unfiled) {
            self.place(note);
        }
        idx
    }

    pub fn clear_notes(&mut self) {
        for section in &mut self.sections {
            section.notes.clear();
        }
        self.unfiled.clear();
    }

    /// Stable per-container sort: dated notes first by date, undated last.
    pub fn sort_by_deadline(&mut self) {
        for section in &mut self.sections {
            section.notes.sort_by(compare_deadlines);
        }
        self.unfiled.sort_by(compare_deadlines);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.sections
            .iter()
            .flat_map(|s| s.notes.iter())
            .chain(self.unfiled.iter())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flattens the board into storage order without touching the store.
pub fn serialize_all(board: &Board) -> Vec<NoteRecord> {
    board.iter().map(Note::to_record).collect()
}

fn compare_deadlines(a: &Note, b: &Note) -> Ordering {
    match (a.deadline, b.deadline) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
