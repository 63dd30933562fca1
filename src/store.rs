//! Store Module
//!
//! Get/set/delete over one mapping persisted in `<root>/data.json`.
//!
//! ## Per-call cycle
//! 1. Ensure the storage root exists
//! 2. Ensure the data file exists (written as an empty mapping if absent)
//! 3. Load and decode the whole file
//! 4. Mutate the mapping (set/delete only)
//! 5. Encode and overwrite the whole file (set/delete only)
//!
//! Nothing is cached between calls; edits made to the file by other
//! processes are seen on the next call.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::codec::{self, Mapping};
use crate::command::Command;
use crate::config::Config;
use crate::error::{FlatKvError, Result};

/// Handle over one storage root
///
/// ## Concurrency
///
/// With `serialize_access` enabled (the default) every operation holds
/// `lock` for the full ensure/load/mutate/persist cycle, so callers sharing
/// one handle (e.g. behind an `Arc`) never lose updates.
///
/// With it disabled there is no coordination at all: two concurrent
/// mutations can read the same snapshot and the later write wins,
/// silently dropping the other one.
///
/// Separate handles on the same root never share a lock.
pub struct Store {
    /// Directory holding the data file
    root: PathBuf,

    /// `<root>/data.json`
    data_path: PathBuf,

    /// Present when operations are serialized
    lock: Option<Mutex<()>>,
}

impl Store {
    const DATA_FILENAME: &'static str = "data.json";

    /// Create a store handle for the configured storage root
    ///
    /// No I/O happens here; the root and data file are created lazily by
    /// the first operation that needs them.
    pub fn open(config: &Config) -> Self {
        let root = config.data_dir.clone();
        let data_path = root.join(Self::DATA_FILENAME);

        Self {
            root,
            data_path,
            lock: config.serialize_access.then(|| Mutex::new(())),
        }
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage root
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        let config = Config::builder().data_dir(path).build();
        Self::open(&config)
    }

    /// Execute a command
    ///
    /// Returns the value for `Get`, `None` for mutations
    pub fn execute(&self, command: Command) -> Result<Option<Vec<u8>>> {
        match command {
            Command::Get { key } => self.get(&key).map(Some),
            Command::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(None)
            }
            Command::Delete { key } => {
                self.delete(&key)?;
                Ok(None)
            }
        }
    }

    /// Get the value stored under `key`
    ///
    /// An absent key yields an empty value, not an error.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());

        let mut mapping = self.load()?;
        Ok(mapping.remove(key).unwrap_or_default())
    }

    /// Insert or overwrite `key`, rewriting the whole file
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());

        let mut mapping = self.load()?;
        mapping.insert(key.to_vec(), value.to_vec());
        self.persist(&mapping)
    }

    /// Remove `key` if present, rewriting the whole file
    ///
    /// Removing an absent key succeeds and still rewrites the file.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());

        let mut mapping = self.load()?;
        mapping.remove(key);
        self.persist(&mapping)
    }

    /// Load the full mapping as currently stored
    pub fn snapshot(&self) -> Result<Mapping> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());

        self.load()
    }

    // =========================================================================
    // Load / Persist
    // =========================================================================

    /// Steps 1-3: ensure root, ensure file, read and decode
    fn load(&self) -> Result<Mapping> {
        self.ensure_root()
            .map_err(|source| Self::unavailable(&self.root, source))?;

        if !self.data_path.exists() {
            let empty = codec::empty()?;
            fs::write(&self.data_path, empty)
                .map_err(|source| Self::unavailable(&self.data_path, source))?;
            tracing::debug!("Created empty data file {}", self.data_path.display());
        }

        let content = fs::read(&self.data_path)
            .map_err(|source| Self::unavailable(&self.data_path, source))?;

        let mapping = codec::decode(&content).map_err(|e| {
            tracing::warn!("Data file {} is corrupt: {}", self.data_path.display(), e);
            FlatKvError::CorruptStore {
                path: self.data_path.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::trace!(
            "Loaded {} entries ({} bytes) from {}",
            mapping.len(),
            content.len(),
            self.data_path.display()
        );

        Ok(mapping)
    }

    /// Step 5: encode and overwrite the data file
    fn persist(&self, mapping: &Mapping) -> Result<()> {
        let encoded = codec::encode(mapping)?;

        // The root may have been removed since load
        self.ensure_root().map_err(|source| FlatKvError::WriteFailure {
            path: self.root.clone(),
            source,
        })?;

        fs::write(&self.data_path, &encoded).map_err(|source| FlatKvError::WriteFailure {
            path: self.data_path.clone(),
            source,
        })?;

        tracing::debug!(
            "Persisted {} entries ({} bytes) to {}",
            mapping.len(),
            encoded.len(),
            self.data_path.display()
        );

        Ok(())
    }

    fn ensure_root(&self) -> std::io::Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)
    }

    fn unavailable(path: &Path, source: std::io::Error) -> FlatKvError {
        FlatKvError::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the data file path
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Whether operations on this handle are serialized
    pub fn is_serialized(&self) -> bool {
        self.lock.is_some()
    }
}
