use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CATEGORIES_KEY: &str = "noteCategories";
pub const CATEGORY_COLORS_KEY: &str = "categoryColors";
pub const NOTES_KEY: &str = "stickyNotes";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Environment variable that points at an explicit store file.
pub const STORE_ENV: &str = "STICKIES_STORE";

const PROJECT_DIR: &str = ".stickies";
const STORE_FILE: &str = "store.yml";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store i/o failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {} is not valid yaml: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("value under {key} is malformed: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not locate a data directory")]
    NoDataDir,
}

/// String-keyed string store. Writes to different keys are independent:
/// nothing ties a categories write to the notes write that follows it.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Reads `key` and decodes it as JSON. An absent key is `Ok(None)`.
pub fn load_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.read(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub fn save_json<S, T>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &raw)
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Keeps every key in a single YAML map on disk. The file is rewritten in
/// full after each write or remove.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let data = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&data).map_err(|source| StoreError::Yaml {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(FileStore { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = serde_yaml::to_string(&self.entries).map_err(|source| StoreError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, serialized).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Explicit,
    Project,
    Global,
}

impl StoreScope {
    pub fn label(&self) -> &'static str {
        match self {
            StoreScope::Explicit => "explicit",
            StoreScope::Project => "project",
            StoreScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub path: PathBuf,
    pub scope: StoreScope,
}

impl StoreLocation {
    pub fn open(&self) -> Result<FileStore, StoreError> {
        FileStore::open(&self.path)
    }

    /// Sibling file used for the TUI log.
    pub fn log_path(&self) -> PathBuf {
        self.path.with_file_name("stickies.log")
    }
}

/// Creates `.stickies/store.yml` under `dir` unless one already exists.
pub fn init_project_store(dir: &Path) -> Result<StoreLocation, StoreError> {
    let store_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&store_dir).map_err(|source| StoreError::Io {
        path: store_dir.clone(),
        source,
    })?;
    let path = store_dir.join(STORE_FILE);
    if !path.exists() {
        fs::write(&path, "").map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
    }
    Ok(StoreLocation {
        path,
        scope: StoreScope::Project,
    })
}

/// Resolution order: explicit path, `STICKIES_STORE`, the nearest project
/// store at or above `start`, then the per-user data directory.
pub fn locate_store(start: &Path, explicit: Option<&Path>) -> Result<StoreLocation, StoreError> {
    if let Some(path) = explicit {
        return Ok(StoreLocation {
            path: path.to_path_buf(),
            scope: StoreScope::Explicit,
        });
    }
    if let Some(path) = env::var_os(STORE_ENV).filter(|v| !v.is_empty()) {
        return Ok(StoreLocation {
            path: PathBuf::from(path),
            scope: StoreScope::Explicit,
        });
    }
    if let Some(path) = find_project_store(start) {
        return Ok(StoreLocation {
            path,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        path: global_store_path()?,
        scope: StoreScope::Global,
    })
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_DIR).join(STORE_FILE))
        .find(|candidate| candidate.exists())
}

fn global_store_path() -> Result<PathBuf, StoreError> {
    let dirs = ProjectDirs::from("", "", "stickies").ok_or(StoreError::NoDataDir)?;
    Ok(dirs.data_dir().join(STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_reads_back_writes() {
        let mut store = MemoryStore::new();
        assert_eq!(store.read("missing").unwrap(), None);
        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let mut store = MemoryStore::new();
        store.write(CATEGORIES_KEY, "[not json").unwrap();
        let err = load_json::<_, Vec<String>>(&store, CATEGORIES_KEY).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn file_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("store.yml");
        {
            let mut store = FileStore::open(&path).unwrap();
            save_json(&mut store, CATEGORIES_KEY, &["Work", "Home"]).unwrap();
            store.write(DARK_MODE_KEY, "enabled").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        let cats: Vec<String> = load_json(&store, CATEGORIES_KEY).unwrap().unwrap();
        assert_eq!(cats, vec!["Work".to_string(), "Home".to_string()]);
        assert_eq!(store.read(DARK_MODE_KEY).unwrap().as_deref(), Some("enabled"));
    }

    #[test]
    fn init_creates_project_store_found_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let location = init_project_store(tmp.path()).unwrap();
        assert!(location.path.exists());

        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_store(&nested), Some(location.path.clone()));

        let store = location.open().unwrap();
        assert_eq!(store.read(NOTES_KEY).unwrap(), None);
    }

    #[test]
    fn explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        init_project_store(tmp.path()).unwrap();
        let explicit = tmp.path().join("elsewhere.yml");
        let location = locate_store(tmp.path(), Some(&explicit)).unwrap();
        assert_eq!(location.scope, StoreScope::Explicit);
        assert_eq!(location.path, explicit);
    }
}
