//! Module Sources
//!
//! The boundary between the scanner and wherever compiled type definitions
//! actually live. A source enumerates the type names one module provides
//! and resolves a referenced name to its raw record bytes, which is all the
//! scanner needs for supertype and interface walking.
//!
//! "Type not found" is an `Ok(None)`, not an error; only real I/O failures
//! surface as `SourceError` and abort a scan.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::typedef::TypeDef;

/// File extension for type definition records in a directory module.
pub const TYPEDEF_EXTENSION: &str = "tdef";

/// I/O failure while reading a module. Always fatal to the scan.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read module resource: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An enumerable, resolvable set of compiled type definitions.
pub trait ModuleSource {
    /// Short human-readable description for logs and diagnostics.
    fn describe(&self) -> String;

    /// All type names this module provides, sorted.
    fn type_names(&self) -> Result<Vec<String>, SourceError>;

    /// Raw record bytes for a type name. `Ok(None)` when the module does
    /// not provide the type.
    fn resolve(&self, type_name: &str) -> Result<Option<Vec<u8>>, SourceError>;
}

/// A directory of `<type.name>.tdef` files, one per type.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, type_name: &str) -> PathBuf {
        self.root.join(format!("{type_name}.{TYPEDEF_EXTENSION}"))
    }
}

impl ModuleSource for DirSource {
    fn describe(&self) -> String {
        format!("module directory {}", self.root.display())
    }

    fn type_names(&self) -> Result<Vec<String>, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(OsStr::to_str) != Some(TYPEDEF_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(OsStr::to_str) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn resolve(&self, type_name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        // a referenced name is never a path
        if type_name.contains(['/', '\\']) {
            return Ok(None);
        }
        let path = self.file_for(type_name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SourceError::Io { path, source }),
        }
    }
}

/// In-memory module, used by tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    types: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: impl Into<String>, bytes: Vec<u8>) {
        self.types.insert(type_name.into(), bytes);
    }

    /// Encode and insert a type definition under its own name.
    pub fn insert_type(&mut self, def: &TypeDef) {
        self.insert(def.name.clone(), def.encode());
    }

    pub fn remove(&mut self, type_name: &str) -> bool {
        self.types.remove(type_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ModuleSource for MemorySource {
    fn describe(&self) -> String {
        format!("in-memory module ({} types)", self.types.len())
    }

    fn type_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.types.keys().cloned().collect())
    }

    fn resolve(&self, type_name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self.types.get(type_name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::typedef::MemberDef;

    #[test]
    fn test_dir_source_enumerates_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.Two", "a.One", "c.Three"] {
            let def = TypeDef::new(name);
            fs::write(dir.path().join(format!("{name}.tdef")), def.encode()).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let source = DirSource::new(dir.path());
        assert_eq!(source.type_names().unwrap(), vec!["a.One", "b.Two", "c.Three"]);
    }

    #[test]
    fn test_dir_source_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let def = TypeDef::new("a.One").with_member(MemberDef::field("x", "int"));
        fs::write(dir.path().join("a.One.tdef"), def.encode()).unwrap();

        let source = DirSource::new(dir.path());
        let bytes = source.resolve("a.One").unwrap().unwrap();
        assert_eq!(TypeDef::decode(&bytes).unwrap(), def);
        assert!(source.resolve("a.Missing").unwrap().is_none());
    }

    #[test]
    fn test_dir_source_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path());
        assert!(source.resolve("../escape").unwrap().is_none());
    }

    #[test]
    fn test_dir_source_missing_root_is_fatal() {
        let source = DirSource::new("/nonexistent/module/dir");
        assert!(matches!(
            source.type_names(),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new();
        source.insert_type(&TypeDef::new("z.Last"));
        source.insert_type(&TypeDef::new("a.First"));

        assert_eq!(source.type_names().unwrap(), vec!["a.First", "z.Last"]);
        assert!(source.resolve("z.Last").unwrap().is_some());
        assert!(source.resolve("q.None").unwrap().is_none());
        assert!(source.remove("z.Last"));
        assert_eq!(source.len(), 1);
    }
}
