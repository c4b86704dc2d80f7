// piiscrub-core/src/pseudonymize/store.rs
//! Placeholder-to-original mapping stores.
//!
//! A store answers two questions: "what did this placeholder stand for?" and
//! "has this value already been given a placeholder?". The in-memory store
//! lives for one process; the file store persists a JSON document between runs.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ScrubError;

const MAPPING_FILE_TMP_SUFFIX: &str = ".tmp";

/// One placeholder and the value it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub placeholder: String,
    pub original: String,
    pub entity_type: String,
    pub created_at: DateTime<Utc>,
}

impl EntityMapping {
    pub fn new(placeholder: impl Into<String>, original: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            original: original.into(),
            entity_type: entity_type.into(),
            created_at: Utc::now(),
        }
    }
}

/// Storage for pseudonym mappings.
pub trait MappingStore: Send + Debug {
    /// The mapping for a placeholder token, e.g. `[PERSON_1]`.
    fn get(&self, placeholder: &str) -> Option<&EntityMapping>;

    /// The mapping already assigned to `original` for this entity type.
    fn find(&self, entity_type: &str, original: &str) -> Option<&EntityMapping>;

    /// Records a mapping. Fails if the placeholder is already bound to another value.
    fn put(&mut self, mapping: EntityMapping) -> Result<(), ScrubError>;

    /// Number of mappings held for an entity type.
    fn count(&self, entity_type: &str) -> usize;

    /// All mappings in insertion order.
    fn mappings(&self) -> Vec<EntityMapping>;

    /// Persists pending changes. A no-op for stores without backing storage.
    fn flush(&mut self) -> Result<(), ScrubError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    entries: Vec<EntityMapping>,
    by_placeholder: HashMap<String, usize>,
    by_value: HashMap<(String, String), usize>,
    per_entity: HashMap<String, usize>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_mappings(mappings: Vec<EntityMapping>) -> Result<Self, ScrubError> {
        let mut store = Self::new();
        for mapping in mappings {
            store.put(mapping)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MappingStore for InMemoryMappingStore {
    fn get(&self, placeholder: &str) -> Option<&EntityMapping> {
        self.by_placeholder.get(placeholder).map(|&i| &self.entries[i])
    }

    fn find(&self, entity_type: &str, original: &str) -> Option<&EntityMapping> {
        self.by_value
            .get(&(entity_type.to_string(), original.to_string()))
            .map(|&i| &self.entries[i])
    }

    fn put(&mut self, mapping: EntityMapping) -> Result<(), ScrubError> {
        if let Some(existing) = self.get(&mapping.placeholder) {
            if existing.original == mapping.original && existing.entity_type == mapping.entity_type {
                return Ok(());
            }
            return Err(ScrubError::MappingStore(format!(
                "placeholder '{}' is already mapped to a different {} value",
                mapping.placeholder, existing.entity_type
            )));
        }

        let index = self.entries.len();
        self.by_placeholder.insert(mapping.placeholder.clone(), index);
        self.by_value
            .entry((mapping.entity_type.clone(), mapping.original.clone()))
            .or_insert(index);
        *self.per_entity.entry(mapping.entity_type.clone()).or_default() += 1;
        self.entries.push(mapping);
        Ok(())
    }

    fn count(&self, entity_type: &str) -> usize {
        self.per_entity.get(entity_type).copied().unwrap_or(0)
    }

    fn mappings(&self) -> Vec<EntityMapping> {
        self.entries.clone()
    }
}

/// On-disk layout of a mapping file.
#[derive(Debug, Serialize, Deserialize)]
struct MappingFile {
    id: Uuid,
    created_at: DateTime<Utc>,
    mappings: Vec<EntityMapping>,
}

/// A mapping store backed by a JSON file.
///
/// The file is read once on `open` and rewritten atomically by `flush`.
#[derive(Debug)]
pub struct FileMappingStore {
    path: PathBuf,
    id: Uuid,
    created_at: DateTime<Utc>,
    inner: InMemoryMappingStore,
    dirty: bool,
}

impl FileMappingStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ScrubError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            info!("Mapping file {} not found; starting a new one.", path.display());
            return Ok(Self {
                path,
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                inner: InMemoryMappingStore::new(),
                dirty: false,
            });
        }

        let raw = fs::read(&path)?;
        let file: MappingFile = serde_json::from_slice(&raw).map_err(|e| {
            ScrubError::MappingStore(format!("failed to parse mapping file {}: {}", path.display(), e))
        })?;
        debug!("Loaded {} mappings from {} (id {}).", file.mappings.len(), path.display(), file.id);

        Ok(Self {
            path,
            id: file.id,
            created_at: file.created_at,
            inner: InMemoryMappingStore::from_mappings(file.mappings)?,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(MAPPING_FILE_TMP_SUFFIX);
        PathBuf::from(name)
    }
}

impl MappingStore for FileMappingStore {
    fn get(&self, placeholder: &str) -> Option<&EntityMapping> {
        self.inner.get(placeholder)
    }

    fn find(&self, entity_type: &str, original: &str) -> Option<&EntityMapping> {
        self.inner.find(entity_type, original)
    }

    fn put(&mut self, mapping: EntityMapping) -> Result<(), ScrubError> {
        let before = self.inner.len();
        self.inner.put(mapping)?;
        self.dirty |= self.inner.len() != before;
        Ok(())
    }

    fn count(&self, entity_type: &str) -> usize {
        self.inner.count(entity_type)
    }

    fn mappings(&self) -> Vec<EntityMapping> {
        self.inner.mappings()
    }

    fn flush(&mut self) -> Result<(), ScrubError> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = MappingFile {
            id: self.id,
            created_at: self.created_at,
            mappings: self.inner.mappings(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| ScrubError::SerializationError(e.to_string()))?;

        let tmp_path = self.tmp_path();
        {
            let mut options = OpenOptions::new();
            options.create(true).write(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut tmp = options.open(&tmp_path)?;
            tmp.write_all(&json)?;
            tmp.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        self.dirty = false;
        info!("Saved {} mappings to {}.", file.mappings.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_lookup_both_ways() {
        let mut store = InMemoryMappingStore::new();
        store.put(EntityMapping::new("[PERSON_1]", "John Doe", "PERSON")).unwrap();
        assert_eq!(store.get("[PERSON_1]").map(|m| m.original.as_str()), Some("John Doe"));
        assert_eq!(store.find("PERSON", "John Doe").map(|m| m.placeholder.as_str()), Some("[PERSON_1]"));
        assert!(store.find("EMAIL_ADDRESS", "John Doe").is_none());
        assert_eq!(store.count("PERSON"), 1);
        assert_eq!(store.count("URL"), 0);
    }

    #[test]
    fn rebinding_a_placeholder_is_rejected() {
        let mut store = InMemoryMappingStore::new();
        store.put(EntityMapping::new("[PERSON_1]", "John", "PERSON")).unwrap();
        store.put(EntityMapping::new("[PERSON_1]", "John", "PERSON")).unwrap();
        assert_eq!(store.len(), 1);
        let err = store.put(EntityMapping::new("[PERSON_1]", "Jane", "PERSON")).unwrap_err();
        assert!(matches!(err, ScrubError::MappingStore(_)));
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("map.json");

        let mut store = FileMappingStore::open(&path).unwrap();
        store.put(EntityMapping::new("[PHONE_NUMBER_1]", "555-123-4567", "PHONE_NUMBER")).unwrap();
        store.flush().unwrap();
        let id = store.id();

        let reopened = FileMappingStore::open(&path).unwrap();
        assert_eq!(reopened.id(), id);
        assert_eq!(
            reopened.get("[PHONE_NUMBER_1]").map(|m| m.original.as_str()),
            Some("555-123-4567")
        );
        assert!(!reopened.tmp_path().exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileMappingStore::open(&path), Err(ScrubError::MappingStore(_))));
    }
}
