use pretty_assertions::assert_eq;
use stickies::storage::{load_json, save_json, CATEGORIES_KEY, NOTES_KEY};
use stickies::{
    serialize_all, Deadline, FileStore, KeyValueStore, NewNote, NoteRecord, Notebook,
    NotebookError,
};
use tempfile::TempDir;

fn note(title: &str, category: &str, deadline: Option<&str>) -> NewNote {
    NewNote {
        title: Some(title.to_string()),
        body: Some(format!("<p>{}</p>", title)),
        color: Some("#a6e7ff".to_string()),
        category: Some(category.to_string()),
        deadline: deadline.map(|d| d.parse::<Deadline>().unwrap()),
    }
}

#[test]
fn snapshot_round_trips_through_the_file_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yml");

    let mut book = Notebook::open(FileStore::open(&path).unwrap()).unwrap();
    book.create_note(note("plan", "Work", Some("20/10-2026"))).unwrap();
    book.create_note(note("groceries", "Personal", None)).unwrap();
    book.create_note(note("review", "Work", None)).unwrap();
    book.create_note(note("<b>essay</b>", "Ideas", Some("01/01-2027")))
        .unwrap();
    let expected = serialize_all(book.board());
    drop(book);

    let reopened = Notebook::open(FileStore::open(&path).unwrap()).unwrap();
    assert_eq!(serialize_all(reopened.board()), expected);
    let work: Vec<&str> = expected
        .iter()
        .filter(|r| r.category == "Work")
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(work, vec!["plan", "review"]);
}

#[test]
fn first_open_seeds_the_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yml");
    Notebook::open(FileStore::open(&path).unwrap()).unwrap();

    let store = FileStore::open(&path).unwrap();
    let categories: Vec<String> = load_json(&store, CATEGORIES_KEY).unwrap().unwrap();
    assert_eq!(categories, vec!["Work", "Personal", "Ideas", "Tasks"]);
}

#[test]
fn category_removal_rewrites_stored_notes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yml");
    let mut store = FileStore::open(&path).unwrap();
    save_json(&mut store, CATEGORIES_KEY, &["A", "B"]).unwrap();

    let mut book = Notebook::open(store).unwrap();
    book.create_note(note("b-first", "B", None)).unwrap();
    book.create_note(note("moving", "A", None)).unwrap();
    assert_eq!(book.delete_category("A").unwrap(), "B");
    assert!(matches!(
        book.delete_category("B"),
        Err(NotebookError::LastCategory)
    ));
    drop(book);

    let store = FileStore::open(&path).unwrap();
    let records: Vec<NoteRecord> = load_json(&store, NOTES_KEY).unwrap().unwrap();
    let placed: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.title.as_str(), r.category.as_str()))
        .collect();
    assert_eq!(placed, vec![("b-first", "B"), ("moving", "B")]);
}

#[test]
fn sorting_is_persisted_per_category() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yml");
    let mut book = Notebook::open(FileStore::open(&path).unwrap()).unwrap();
    book.create_note(note("undated one", "Tasks", None)).unwrap();
    book.create_note(note("dated", "Tasks", Some("01/01-2030"))).unwrap();
    book.create_note(note("undated two", "Tasks", None)).unwrap();
    book.create_note(note("work late", "Work", Some("01/01-2031")))
        .unwrap();
    book.sort_by_deadline().unwrap();
    drop(book);

    let reopened = Notebook::open(FileStore::open(&path).unwrap()).unwrap();
    let tasks = reopened.board().section_index("Tasks").unwrap();
    let titles: Vec<&str> = reopened.board().sections[tasks]
        .notes
        .iter()
        .map(|n| n.title.as_str())
        .collect();
    assert_eq!(titles, vec!["dated", "undated one", "undated two"]);
    let order: Vec<String> = serialize_all(reopened.board())
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(order.first().map(String::as_str), Some("work late"));
}

#[test]
fn stale_references_and_bad_deadlines_are_recovered_on_load() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yml");
    let mut store = FileStore::open(&path).unwrap();
    save_json(&mut store, CATEGORIES_KEY, &["Ideas", "Work"]).unwrap();
    store
        .write(
            NOTES_KEY,
            r##"[
                {"title":"ghost","body":"","color":"#fff9a6","category":"Gone","deadline":"01/01-2030"},
                {"title":"blank","body":"","color":"#fff9a6","category":"","deadline":"tomorrow"},
                {"title":"legacy","body":"","color":"#fff9a6","category":"Work"}
            ]"##,
        )
        .unwrap();

    let book = Notebook::open(store).unwrap();
    let ideas = &book.board().sections[0];
    assert_eq!(ideas.category, "Ideas");
    let titles: Vec<&str> = ideas.notes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["ghost", "blank"]);
    assert!(ideas.notes.iter().all(|n| n.category == "Ideas"));
    assert_eq!(ideas.notes[1].deadline, None);
    assert_eq!(book.board().sections[1].notes[0].title, "legacy");
}
