use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::MappingError;
use crate::metadata::SelfDescribing;

/// Registry handle shared between drivers in one process.
pub type SharedRegistry = Arc<Mutex<TypeRegistry>>;

/// One known type: its qualified name, the canonical path of the file that
/// declared it, and its self-description capability if it has one.
#[derive(Clone)]
pub struct TypeRecord {
    pub name: String,
    pub origin: PathBuf,
    pub descriptor: Option<Arc<dyn SelfDescribing>>,
}

impl fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRecord")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("self_describing", &self.descriptor.is_some())
            .finish()
    }
}

/// Table of every type loaded so far, in declaration order, plus the set of
/// files already loaded. Append-only from the driver's perspective.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeRecord>,
    loaded_files: HashSet<PathBuf>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Records a type. Re-registering a name from the same origin file is a
    /// no-op; the same name from a different file is an error.
    pub fn register(&mut self, record: TypeRecord) -> Result<(), MappingError> {
        if let Some(existing) = self.types.get(&record.name) {
            if existing.origin == record.origin {
                return Ok(());
            }
            return Err(MappingError::DuplicateType {
                name: record.name,
                existing: existing.origin.clone(),
                duplicate: record.origin,
            });
        }
        self.types.insert(record.name.clone(), record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeRecord> {
        self.types.get(name)
    }

    pub fn declares_metadata(&self, name: &str) -> bool {
        self.types
            .get(name)
            .is_some_and(|record| record.descriptor.is_some())
    }

    pub fn origin_of(&self, name: &str) -> Option<&Path> {
        self.types.get(name).map(|record| record.origin.as_path())
    }

    /// All known types, in the order they were registered.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeRecord> {
        self.types.values()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded_files.contains(path)
    }

    pub fn mark_loaded(&mut self, path: PathBuf) {
        self.loaded_files.insert(path);
    }

    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }
}
