//! Crate-level error type for everything outside the language semantics.
//!
//! Syntax errors are plain strings collected by the parser and runtime
//! failures travel through [`crate::interpreter::InterpretError`]; this
//! module covers the host side: reading source files and locating class
//! units for `new`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use log::info;

/// Canonical host-side error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PronError {
    /// Source file without any extension.
    #[error("missing file type, should be .pron")]
    MissingFileType { path: PathBuf },

    /// Source file with an extension other than `.pron`.
    #[error("file type is not .pron")]
    InvalidFileType { path: PathBuf },

    /// No source unit defines the requested class.
    #[error("There is no Class called: {name}")]
    MissingClass { name: String },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl PronError {
    pub fn missing_class<S: Into<String>>(name: S) -> Self {
        let name: String = name.into();

        info!("Creating MissingClass error: name={}", name);

        PronError::MissingClass { name }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, PronError>;
