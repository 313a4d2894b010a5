use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace};

use crate::error::MappingError;
use crate::metadata::{MetadataDescriptor, SelfDescribing};
use crate::registry::{TypeRecord, TypeRegistry};
use crate::structure;

/// Loads source files of one language into a type registry.
pub trait SourceLoader: Send {
    /// File extension (without the dot) this loader accepts.
    fn suffix(&self) -> &str;

    /// Loads one source file into the registry and returns its canonical
    /// path. A file that is already loaded is not parsed again but still
    /// reports its canonical path.
    fn load_file(&self, path: &Path, registry: &mut TypeRegistry)
    -> Result<PathBuf, MappingError>;
}

/// Loader for `.java` sources backed by the tree-sitter grammar.
#[derive(Debug, Default)]
pub struct JavaSourceLoader;

impl JavaSourceLoader {
    pub fn new() -> Self {
        Self
    }
}

impl SourceLoader for JavaSourceLoader {
    fn suffix(&self) -> &str {
        "java"
    }

    fn load_file(
        &self,
        path: &Path,
        registry: &mut TypeRegistry,
    ) -> Result<PathBuf, MappingError> {
        let canonical = path.canonicalize().map_err(|e| MappingError::SourceRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if registry.is_loaded(&canonical) {
            trace!("already loaded: {}", canonical.display());
            return Ok(canonical);
        }

        let source = std::fs::read_to_string(&canonical).map_err(|e| MappingError::SourceRead {
            path: canonical.clone(),
            source: e,
        })?;
        let parsed = structure::parse_source(&canonical, &source)?;

        for ty in &parsed.types {
            let descriptor = ty
                .directives
                .clone()
                .map(|d| Arc::new(MetadataDescriptor::new(d)) as Arc<dyn SelfDescribing>);
            registry.register(TypeRecord {
                name: parsed.qualified_name(&ty.name),
                origin: canonical.clone(),
                descriptor,
            })?;
        }
        registry.mark_loaded(canonical.clone());
        debug!(
            "loaded {} type(s) from {}",
            parsed.types.len(),
            canonical.display()
        );
        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    const USER_SOURCE: &str = r#"
package org.example;

public class User {
    public static void loadMetadata(ClassMetadata metadata) {
        metadata.setTableName("users");
        metadata.mapIdField("id", "bigint");
    }
}
"#;

    #[test]
    fn load_registers_entity_with_descriptor() {
        let dir = temp_dir("entity-finder-loader");
        let path = write_file(&dir, "User.java", USER_SOURCE);

        let loader = JavaSourceLoader::new();
        let mut registry = TypeRegistry::new();
        let canonical = loader.load_file(&path, &mut registry).unwrap();

        assert_eq!(canonical, path.canonicalize().unwrap());
        assert_eq!(registry.type_count(), 1);
        assert!(registry.declares_metadata("org.example.User"));
        assert_eq!(
            registry.origin_of("org.example.User"),
            Some(canonical.as_path())
        );
    }

    #[test]
    fn plain_class_is_registered_without_descriptor() {
        let dir = temp_dir("entity-finder-loader-plain");
        let path = write_file(&dir, "Helper.java", "package org.example;\nclass Helper {}\n");

        let loader = JavaSourceLoader::new();
        let mut registry = TypeRegistry::new();
        loader.load_file(&path, &mut registry).unwrap();

        assert_eq!(registry.type_count(), 1);
        assert!(registry.get("org.example.Helper").is_some());
        assert!(!registry.declares_metadata("org.example.Helper"));
    }

    #[test]
    fn second_load_of_same_file_is_a_no_op() {
        let dir = temp_dir("entity-finder-loader-again");
        let path = write_file(&dir, "User.java", USER_SOURCE);

        let loader = JavaSourceLoader::new();
        let mut registry = TypeRegistry::new();
        loader.load_file(&path, &mut registry).unwrap();
        loader.load_file(&path, &mut registry).unwrap();

        assert_eq!(registry.type_count(), 1);
        assert_eq!(registry.loaded_file_count(), 1);
    }

    #[test]
    fn relative_spellings_resolve_to_one_file() {
        let dir = temp_dir("entity-finder-loader-canon");
        let path = write_file(&dir, "User.java", USER_SOURCE);
        let dotted = dir.join(".").join("User.java");

        let loader = JavaSourceLoader::new();
        let mut registry = TypeRegistry::new();
        let first = loader.load_file(&path, &mut registry).unwrap();
        let second = loader.load_file(&dotted, &mut registry).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.loaded_file_count(), 1);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = temp_dir("entity-finder-loader-missing");
        let loader = JavaSourceLoader::new();
        let mut registry = TypeRegistry::new();

        let err = loader
            .load_file(&dir.join("Nope.java"), &mut registry)
            .unwrap_err();
        assert!(matches!(err, MappingError::SourceRead { .. }));
    }

    #[test]
    fn redeclaring_a_type_from_another_file_fails() {
        let dir = temp_dir("entity-finder-loader-dup");
        let first = write_file(&dir, "User.java", USER_SOURCE);
        let second = write_file(
            &dir,
            "UserCopy.java",
            "package org.example;\nclass User {}\n",
        );

        let loader = JavaSourceLoader::new();
        let mut registry = TypeRegistry::new();
        loader.load_file(&first, &mut registry).unwrap();

        let err = loader.load_file(&second, &mut registry).unwrap_err();
        match err {
            MappingError::DuplicateType { name, .. } => assert_eq!(name, "org.example.User"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
