//! Discovery driver for self-describing entity classes.
//!
//! The driver walks its configured directories once, loads every matching
//! source file into the shared registry, and remembers which classes expose
//! mapping metadata. The class list is computed lazily and memoized; paths
//! added after the first discovery run do not refresh it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::error::MappingError;
use crate::loader::{JavaSourceLoader, SourceLoader};
use crate::metadata::MetadataSink;
use crate::registry::SharedRegistry;
use crate::scan;

pub struct StaticSourceDriver {
    paths: Vec<PathBuf>,
    registry: SharedRegistry,
    loader: Box<dyn SourceLoader>,
    class_names: Option<Vec<String>>,
}

impl StaticSourceDriver {
    /// Driver over `.java` sources. Several drivers may share one registry;
    /// each keeps its own paths and its own memoized class list.
    pub fn new(paths: impl IntoIterator<Item = PathBuf>, registry: SharedRegistry) -> Self {
        Self::with_loader(paths, registry, Box::new(JavaSourceLoader::new()))
    }

    pub fn with_loader(
        paths: impl IntoIterator<Item = PathBuf>,
        registry: SharedRegistry,
        loader: Box<dyn SourceLoader>,
    ) -> Self {
        let mut driver = Self {
            paths: Vec::new(),
            registry,
            loader,
            class_names: None,
        };
        driver.add_paths(paths);
        driver
    }

    /// Appends lookup paths, skipping ones already configured. A class list
    /// memoized by an earlier [`get_all_class_names`](Self::get_all_class_names)
    /// call stays as it is.
    pub fn add_paths(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            if !self.paths.contains(&path) {
                self.paths.push(path);
            }
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Names of all entity classes declared under the configured paths, in
    /// declaration order.
    ///
    /// The first call scans every path; later calls return the memoized
    /// list. A failed scan is not memoized, so the caller may fix the
    /// configuration and retry. Files loaded before the failure stay in the
    /// registry either way.
    pub fn get_all_class_names(&mut self) -> Result<Vec<String>, MappingError> {
        if let Some(cached) = &self.class_names {
            return Ok(cached.clone());
        }
        if self.paths.is_empty() {
            return Err(MappingError::PathRequired);
        }

        let mut included: HashSet<PathBuf> = HashSet::new();
        for path in &self.paths {
            if !path.is_dir() {
                return Err(MappingError::NotADirectory { path: path.clone() });
            }
            let files = scan::source_files(path, self.loader.suffix());
            let mut registry = self.registry.lock();
            for file in &files {
                // Recorded even when the file was already loaded, so types
                // another driver pulled in are still attributed to this run.
                let canonical = self.loader.load_file(file, &mut registry)?;
                included.insert(canonical);
            }
        }

        let names: Vec<String> = {
            let registry = self.registry.lock();
            registry
                .all_types()
                .filter(|record| record.descriptor.is_some() && included.contains(&record.origin))
                .map(|record| record.name.clone())
                .collect()
        };
        debug!(
            "discovered {} entity class(es) across {} path(s)",
            names.len(),
            self.paths.len()
        );

        self.class_names = Some(names.clone());
        Ok(names)
    }

    /// A type is transient when it does not describe its own mapping. Names
    /// the registry has never seen are transient as well.
    pub fn is_transient(&self, class_name: &str) -> bool {
        !self.registry.lock().declares_metadata(class_name)
    }

    /// Replays the class's mapping directives into `sink`.
    pub fn load_metadata_for_class(
        &self,
        class_name: &str,
        sink: &mut dyn MetadataSink,
    ) -> Result<(), MappingError> {
        let descriptor = {
            let registry = self.registry.lock();
            let record = registry
                .get(class_name)
                .ok_or_else(|| MappingError::UnknownType {
                    name: class_name.to_string(),
                })?;
            record
                .descriptor
                .clone()
                .ok_or_else(|| MappingError::MissingCapability {
                    name: class_name.to_string(),
                })?
        };
        descriptor.load_metadata(sink);
        Ok(())
    }

    /// Canonical origin file of a known type, if any.
    pub fn origin_of(&self, class_name: &str) -> Option<PathBuf> {
        self.registry
            .lock()
            .origin_of(class_name)
            .map(Path::to_path_buf)
    }
}
