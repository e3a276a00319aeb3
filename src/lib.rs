pub mod board;
pub mod model;
pub mod notebook;
pub mod registry;
pub mod storage;

pub use board::{serialize_all, Board, NoteRef, Section, Slot};
pub use model::{Deadline, DeadlineStatus, Note, NoteRecord, Theme};
pub use notebook::{NewNote, Notebook, NotebookError};
pub use registry::{CategoryRegistry, RegistryError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreLocation, StoreScope};
