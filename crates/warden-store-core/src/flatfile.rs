// crates/warden-store-core/src/flatfile.rs
// ============================================================================
// Module: Warden Store Flat-File Base
// Description: Per-container document storage shared by file backends.
// Purpose: Own in-memory documents, their locks, and full-file persistence.
// Dependencies: tempfile, tracing, crate::{error, schema}
// ============================================================================

//! ## Overview
//! File backends keep one in-memory document per container. A
//! [`DocumentStore`] guards each document with its own mutex, held for the
//! whole read → evaluate → mutate → persist sequence so concurrent writers on
//! the same container serialize. Every mutation rewrites the full file
//! through a temporary file in the same folder followed by a rename; there is
//! no incremental write path.
//!
//! Backends supply the on-disk encoding through [`DocumentFormat`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;
use crate::schema::Container;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of a single container file accepted on load.
pub const MAX_CONTAINER_FILE_BYTES: u64 = 256 * 1024 * 1024;

// ============================================================================
// SECTION: Document Format
// ============================================================================

/// On-disk encoding of a container document.
pub trait DocumentFormat: Send + Sync + 'static {
    /// In-memory representation of one container.
    type Document: Default + Send;

    /// File extension without the leading dot.
    const EXTENSION: &'static str;

    /// Decodes a container file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] when the bytes are not a valid document.
    fn parse(container: Container, bytes: &[u8]) -> Result<Self::Document, StorageError>;

    /// Encodes a container document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the document cannot be encoded.
    fn render(container: Container, document: &Self::Document) -> Result<Vec<u8>, StorageError>;
}

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Per-container documents with their backing files.
pub struct DocumentStore<F: DocumentFormat> {
    /// Storage folder holding every container file.
    folder: PathBuf,
    /// One locked document per container.
    documents: BTreeMap<Container, Mutex<F::Document>>,
    /// Marker for the encoding.
    format: PhantomData<fn() -> F>,
}

impl<F: DocumentFormat> DocumentStore<F> {
    /// Opens the store, loading every container file that exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the folder or a file cannot be read
    /// and [`StorageError::Corrupt`] when a file cannot be decoded.
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let folder = folder.into();
        fs::create_dir_all(&folder).map_err(|err| StorageError::Io(err.to_string()))?;
        let mut documents = BTreeMap::new();
        for container in Container::ALL {
            let path = folder.join(container.file_name(F::EXTENSION));
            let document = load_document::<F>(container, &path)?;
            documents.insert(container, Mutex::new(document));
        }
        Ok(Self {
            folder,
            documents,
            format: PhantomData,
        })
    }

    /// Returns the storage folder.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Returns the file path for a container.
    #[must_use]
    pub fn path_for(&self, container: Container) -> PathBuf {
        self.folder.join(container.file_name(F::EXTENSION))
    }

    /// Runs a read-only closure against a container document.
    ///
    /// # Errors
    ///
    /// Returns errors from the closure or [`StorageError::Backend`] when the
    /// lock is poisoned.
    pub fn read<R>(
        &self,
        container: Container,
        reader: impl FnOnce(&F::Document) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let guard = self.slot(container)?.lock().map_err(|_| poisoned(container))?;
        reader(&guard)
    }

    /// Runs a mutating closure and persists the document when it reports a change.
    ///
    /// The closure returns its result plus whether the document changed. The
    /// container lock is held until the file has been rewritten.
    ///
    /// # Errors
    ///
    /// Returns errors from the closure, [`StorageError::Io`] when persisting
    /// fails, or [`StorageError::Backend`] when the lock is poisoned.
    pub fn write<R>(
        &self,
        container: Container,
        writer: impl FnOnce(&mut F::Document) -> Result<(R, bool), StorageError>,
    ) -> Result<R, StorageError> {
        let mut guard = self.slot(container)?.lock().map_err(|_| poisoned(container))?;
        let (result, changed) = writer(&mut guard)?;
        if changed {
            self.persist(container, &guard)?;
        }
        drop(guard);
        Ok(result)
    }

    /// Lists containers whose file does not exist on disk.
    #[must_use]
    pub fn missing(&self) -> Vec<Container> {
        Container::ALL.into_iter().filter(|container| !self.path_for(*container).is_file()).collect()
    }

    /// Writes a container file from its current document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the file cannot be written.
    pub fn create(&self, container: Container) -> Result<(), StorageError> {
        let guard = self.slot(container)?.lock().map_err(|_| poisoned(container))?;
        self.persist(container, &guard)?;
        drop(guard);
        debug!(container = container.name(), folder = %self.folder.display(), "created container file");
        Ok(())
    }

    /// Persists every container exactly once.
    ///
    /// # Errors
    ///
    /// Returns the first persistence failure; later containers are still attempted.
    pub fn flush_all(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for container in Container::ALL {
            let result = self.slot(container).and_then(|slot| {
                let guard = slot.lock().map_err(|_| poisoned(container))?;
                self.persist(container, &guard)
            });
            if let Err(err) = result
                && first_error.is_none()
            {
                first_error = Some(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Returns the lock slot for a container.
    fn slot(&self, container: Container) -> Result<&Mutex<F::Document>, StorageError> {
        self.documents.get(&container).ok_or_else(|| {
            StorageError::Backend(format!("container {container} is not registered"))
        })
    }

    /// Rewrites the full container file.
    fn persist(&self, container: Container, document: &F::Document) -> Result<(), StorageError> {
        let bytes = F::render(container, document)?;
        write_atomically(&self.folder, &self.path_for(container), &bytes)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads a container document, defaulting when the file is absent.
fn load_document<F: DocumentFormat>(
    container: Container,
    path: &Path,
) -> Result<F::Document, StorageError> {
    if !path.exists() {
        return Ok(F::Document::default());
    }
    let metadata = fs::metadata(path).map_err(|err| StorageError::Io(err.to_string()))?;
    if !metadata.is_file() {
        return Err(StorageError::Io(format!("{} is not a file", path.display())));
    }
    if metadata.len() > MAX_CONTAINER_FILE_BYTES {
        return Err(StorageError::Corrupt(format!(
            "{} exceeds size limit of {MAX_CONTAINER_FILE_BYTES} bytes",
            path.display()
        )));
    }
    let bytes = fs::read(path).map_err(|err| StorageError::Io(err.to_string()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(F::Document::default());
    }
    F::parse(container, &bytes)
}

/// Writes bytes through a temporary sibling file and renames it into place.
///
/// # Errors
///
/// Returns [`StorageError::Io`] when any step fails.
pub fn write_atomically(folder: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut temp = NamedTempFile::new_in(folder).map_err(|err| StorageError::Io(err.to_string()))?;
    temp.write_all(bytes).map_err(|err| StorageError::Io(err.to_string()))?;
    temp.as_file().sync_all().map_err(|err| StorageError::Io(err.to_string()))?;
    temp.persist(path).map_err(|err| StorageError::Io(err.error.to_string()))?;
    Ok(())
}

/// Builds the error for a poisoned container lock.
fn poisoned(container: Container) -> StorageError {
    StorageError::Backend(format!("{container} document mutex poisoned"))
}

/// Parses a top-level document key as a row ID.
#[must_use]
pub fn parse_row_key(key: &str) -> Option<i64> {
    key.parse::<i64>().ok().filter(|id| *id > 0)
}
