use crate::model::{NoteRecord, DEFAULT_CATEGORY_COLOR};
use crate::storage::{
    load_json, save_json, KeyValueStore, StoreError, CATEGORIES_KEY, CATEGORY_COLORS_KEY,
    NOTES_KEY,
};
use std::collections::BTreeMap;

pub const DEFAULT_CATEGORIES: [&str; 4] = ["Work", "Personal", "Ideas", "Tasks"];

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("category name is empty")]
    EmptyInput,
    #[error("category already exists: {0}")]
    DuplicateName(String),
    #[error("category not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Category list and color map, read from and written straight through to
/// the store on every call.
pub struct CategoryRegistry<'s, S: KeyValueStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: KeyValueStore + ?Sized> CategoryRegistry<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        CategoryRegistry { store }
    }

    /// Seeds the defaults into the store the first time it is called on an
    /// empty store.
    pub fn list(&mut self) -> Result<Vec<String>, RegistryError> {
        if let Some(saved) = load_json::<_, Vec<String>>(&*self.store, CATEGORIES_KEY)? {
            return Ok(saved);
        }
        let defaults: Vec<String> = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        save_json(&mut *self.store, CATEGORIES_KEY, &defaults)?;
        tracing::debug!("seeded default categories");
        Ok(defaults)
    }

    pub fn add(&mut self, name: &str) -> Result<String, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyInput);
        }
        let mut categories = self.list()?;
        if categories.iter().any(|c| c == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        categories.push(name.to_string());
        save_json(&mut *self.store, CATEGORIES_KEY, &categories)?;
        Ok(name.to_string())
    }

    /// Drops `name` and its color, then points every stored note that used
    /// it at `replacement`. Does not check that `replacement` exists or that
    /// `name` is not the last category.
    pub fn remove(&mut self, name: &str, replacement: &str) -> Result<(), RegistryError> {
        let mut categories = self.list()?;
        let idx = categories
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        categories.remove(idx);
        save_json(&mut *self.store, CATEGORIES_KEY, &categories)?;

        let mut colors = self.colors()?;
        if colors.remove(name).is_some() {
            save_json(&mut *self.store, CATEGORY_COLORS_KEY, &colors)?;
        }

        if let Some(mut notes) = load_json::<_, Vec<NoteRecord>>(&*self.store, NOTES_KEY)? {
            let mut moved = 0usize;
            for note in notes.iter_mut().filter(|n| n.category == name) {
                note.category = replacement.to_string();
                moved += 1;
            }
            save_json(&mut *self.store, NOTES_KEY, &notes)?;
            tracing::debug!(moved, "reassigned notes from {} to {}", name, replacement);
        }
        Ok(())
    }

    pub fn colors(&self) -> Result<BTreeMap<String, String>, RegistryError> {
        Ok(load_json(&*self.store, CATEGORY_COLORS_KEY)?.unwrap_or_default())
    }

    pub fn color_of(&self, name: &str) -> Result<String, RegistryError> {
        Ok(self
            .colors()?
            .remove(name)
            .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()))
    }

    pub fn set_color(&mut self, name: &str, color: &str) -> Result<(), RegistryError> {
        let mut colors = self.colors()?;
        colors.insert(name.to_string(), color.to_string());
        save_json(&mut *self.store, CATEGORY_COLORS_KEY, &colors)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn record(title: &str, category: &str) -> NoteRecord {
        NoteRecord {
            title: title.into(),
            body: String::new(),
            color: "#fff9a6".into(),
            category: category.into(),
            deadline: String::new(),
        }
    }

    #[test]
    fn first_list_seeds_defaults() {
        let mut store = MemoryStore::new();
        let listed = CategoryRegistry::new(&mut store).list().unwrap();
        assert_eq!(listed, vec!["Work", "Personal", "Ideas", "Tasks"]);
        let stored: Vec<String> = load_json(&store, CATEGORIES_KEY).unwrap().unwrap();
        assert_eq!(stored, listed);
    }

    #[test]
    fn add_trims_and_appends() {
        let mut store = MemoryStore::new();
        let mut registry = CategoryRegistry::new(&mut store);
        assert_eq!(registry.add("  Errands ").unwrap(), "Errands");
        assert_eq!(registry.list().unwrap().last().map(String::as_str), Some("Errands"));
    }

    #[test]
    fn add_rejects_blank_and_duplicates() {
        let mut store = MemoryStore::new();
        let mut registry = CategoryRegistry::new(&mut store);
        assert!(matches!(registry.add("   "), Err(RegistryError::EmptyInput)));
        assert!(matches!(
            registry.add("Work"),
            Err(RegistryError::DuplicateName(name)) if name == "Work"
        ));
        assert_eq!(registry.list().unwrap().len(), 4);
        // Matching is case-sensitive.
        assert!(registry.add("work").is_ok());
    }

    #[test]
    fn remove_reassigns_stored_notes_and_drops_color() {
        let mut store = MemoryStore::new();
        save_json(&mut store, CATEGORIES_KEY, &["A", "B"]).unwrap();
        save_json(
            &mut store,
            NOTES_KEY,
            &vec![record("one", "A"), record("two", "B"), record("three", "A")],
        )
        .unwrap();
        let mut registry = CategoryRegistry::new(&mut store);
        registry.set_color("A", "#00ff00").unwrap();

        registry.remove("A", "B").unwrap();

        assert_eq!(registry.list().unwrap(), vec!["B"]);
        assert_eq!(registry.color_of("A").unwrap(), DEFAULT_CATEGORY_COLOR);
        let notes: Vec<NoteRecord> = load_json(&store, NOTES_KEY).unwrap().unwrap();
        let categories: Vec<&str> = notes.iter().map(|n| n.category.as_str()).collect();
        assert_eq!(categories, vec!["B", "B", "B"]);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut store = MemoryStore::new();
        let mut registry = CategoryRegistry::new(&mut store);
        assert!(matches!(
            registry.remove("Nope", "Work"),
            Err(RegistryError::NotFound(_))
        ));
        assert_eq!(registry.list().unwrap().len(), 4);
    }

    #[test]
    fn color_defaults_until_set() {
        let mut store = MemoryStore::new();
        let mut registry = CategoryRegistry::new(&mut store);
        assert_eq!(registry.color_of("Work").unwrap(), DEFAULT_CATEGORY_COLOR);
        registry.set_color("Work", "#ffa500").unwrap();
        registry.set_color("Work", "#ff69b4").unwrap();
        assert_eq!(registry.color_of("Work").unwrap(), "#ff69b4");
    }
}
