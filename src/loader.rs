//! Locating source units on behalf of `new Name(…)`.
//!
//! When a class name is not bound anywhere in scope the evaluator asks its
//! [`SourceLoader`] for a unit called `Name` and evaluates it in place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{PronError, Result};

/// Canonical extension of Pron source files.
pub const EXTENSION: &str = "pron";

/// Supplies the source text of a class unit by class name.
pub trait SourceLoader {
    fn load(&self, class_name: &str) -> Result<String>;
}

/// Resolves `<root>/<ClassName>.pron` on disk.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsLoader {
    /// Loads relative to the working directory.
    fn default() -> Self {
        Self::new(".")
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, class_name: &str) -> Result<String> {
        let path = self.root.join(format!("{}.{}", class_name, EXTENSION));

        debug!("Looking for class {} at {:?}", class_name, path);

        if !path.is_file() {
            return Err(PronError::missing_class(class_name));
        }

        let bytes = fs::read(&path)?;
        let source = String::from_utf8(bytes)?;

        info!("Loaded {} bytes for class {}", source.len(), class_name);

        Ok(source)
    }
}

/// In-memory units, keyed by class name. Handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    units: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit<N: Into<String>, S: Into<String>>(mut self, name: N, source: S) -> Self {
        self.units.insert(name.into(), source.into());
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, class_name: &str) -> Result<String> {
        self.units
            .get(class_name)
            .cloned()
            .ok_or_else(|| PronError::missing_class(class_name))
    }
}

/// Rejects paths that do not carry the `.pron` extension.
pub fn check_source_path(path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        None => Err(PronError::MissingFileType {
            path: path.to_path_buf(),
        }),
        Some(EXTENSION) => Ok(()),
        Some(_) => Err(PronError::InvalidFileType {
            path: path.to_path_buf(),
        }),
    }
}
