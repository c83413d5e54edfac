//! Result store capability and its filesystem implementation

use crate::config::{DEFAULT_COMPRESSION_LEVEL, StoreConfig};
use crate::format::{Format, MessagePack};
use crate::root::StoreRoot;
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Content-addressed key/value storage for computed results
pub trait ResultStore {
    /// Whether a readable record exists for `key`
    ///
    /// Never fails; a missing or unusable key reports `false`.
    fn exists(&self, key: &str) -> bool;

    /// Read the record for `key`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no record and
    /// [`Error::CorruptRecord`] if it cannot be decoded
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T>;

    /// Store `value` under `key`, replacing any existing record, and hand
    /// the value back
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized or persisted
    fn write<T: Serialize>(&self, key: &str, value: T) -> Result<T>;
}

impl<S: ResultStore + ?Sized> ResultStore for &S {
    fn exists(&self, key: &str) -> bool {
        (**self).exists(key)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        (**self).read(key)
    }

    fn write<T: Serialize>(&self, key: &str, value: T) -> Result<T> {
        (**self).write(key, value)
    }
}

impl<S: ResultStore + ?Sized> ResultStore for Arc<S> {
    fn exists(&self, key: &str) -> bool {
        (**self).exists(key)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        (**self).read(key)
    }

    fn write<T: Serialize>(&self, key: &str, value: T) -> Result<T> {
        (**self).write(key, value)
    }
}

/// Filesystem result store
///
/// Each record lives at `root/<key>` as a zstd frame around the serialized
/// value. Keys may contain `/` or `\` separated segments, which become
/// nested directories. Writes go through a temporary file in the target
/// directory followed by a rename, so a concurrent reader sees either the
/// old record or the new one.
///
/// ```text
/// <root>/
///   3f/
///     3fa9c1...   (record for key "3f/3fa9c1...")
///   9b0e27...     (record for key "9b0e27...")
/// ```
#[derive(Debug, Clone)]
pub struct FsStore<F = MessagePack> {
    root: StoreRoot,
    format: F,
    compression_level: i32,
}

impl FsStore<MessagePack> {
    /// Create a MessagePack store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_format(root, MessagePack)
    }

    /// Create a MessagePack store from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no root can be
    /// resolved
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.resolve_root()?).compression_level(config.compression_level))
    }
}

impl<F: Format> FsStore<F> {
    /// Create a store with an explicit format
    #[must_use]
    pub fn with_format(root: impl Into<PathBuf>, format: F) -> Self {
        Self {
            root: StoreRoot::new(root),
            format,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Set the zstd compression level used for new records
    #[must_use]
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// The shared root handle
    #[must_use]
    pub fn root_handle(&self) -> &StoreRoot {
        &self.root
    }

    /// The current root directory
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.root.get()
    }

    /// Move the store to a new root directory
    pub fn set_root(&self, path: impl Into<PathBuf>) {
        self.root.set(path);
    }

    /// Run `action` with the store rooted at `path`, then restore the
    /// previous root on every exit path
    pub fn with_root<R>(&self, path: impl Into<PathBuf>, action: impl FnOnce() -> R) -> R {
        let _guard = self.root.scoped(path);
        action()
    }

    /// Location of the record for `key` under the current root
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the key is empty or contains a
    /// segment that could leave the root (`..`, a drive prefix)
    pub fn record_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.get().join(key_to_relative_path(key)?))
    }
}

impl<F: Format> ResultStore for FsStore<F> {
    fn exists(&self, key: &str) -> bool {
        match self.record_path(key) {
            // A record that cannot be opened would only fail later in `read`
            Ok(path) => path.is_file() && fs::File::open(&path).is_ok(),
            Err(e) => {
                tracing::warn!(key, "Rejected store key: {e}");
                false
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.record_path(key)?;
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound || path.is_dir() => {
                return Err(Error::not_found(key));
            }
            Err(e) => return Err(Error::io(e, &path, "read")),
        };
        let raw = zstd::decode_all(compressed.as_slice())
            .map_err(|e| Error::corrupt_record(key, &path, format!("decompression failed: {e}")))?;
        let value = self
            .format
            .deserialize(&raw)
            .map_err(|e| Error::corrupt_record(key, &path, e.to_string()))?;
        tracing::debug!(key, format = self.format.name(), "Read store record");
        Ok(value)
    }

    fn write<T: Serialize>(&self, key: &str, value: T) -> Result<T> {
        let relative = key_to_relative_path(key)?;
        let root = self.root.get();
        // The root belongs to the caller; only directories below it are created here
        if !root.is_dir() {
            return Err(Error::io(
                io::Error::new(io::ErrorKind::NotFound, "store root is not a directory"),
                &root,
                "write",
            ));
        }
        let path = root.join(relative);

        let raw = self.format.serialize(&value)?;
        let compressed = zstd::encode_all(raw.as_slice(), self.compression_level)
            .map_err(|e| Error::serialization(format!("zstd compression failed: {e}")))?;

        let parent = path
            .parent()
            .ok_or_else(|| Error::invalid_key(key, "record has no parent directory"))?;
        if parent != root.as_path() {
            fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
        }

        // Write to a sibling temporary file, then rename over the record
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| Error::io(e, parent, "create"))?;
        tmp.write_all(&compressed)
            .map_err(|e| Error::io(e, tmp.path(), "write"))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::io(e, tmp.path(), "sync"))?;
        tmp.persist(&path)
            .map_err(|e| Error::io(e.error, &path, "rename"))?;

        tracing::debug!(
            key,
            format = self.format.name(),
            raw_bytes = raw.len(),
            stored_bytes = compressed.len(),
            "Wrote store record"
        );
        Ok(value)
    }
}

/// Turn a key into a relative path made only of plain names
fn key_to_relative_path(key: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in key.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(Error::invalid_key(key, "parent-directory segment")),
            name => {
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(part)), None) => relative.push(part),
                    _ => {
                        return Err(Error::invalid_key(
                            key,
                            format!("segment {name:?} is not a plain name"),
                        ));
                    }
                }
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(Error::invalid_key(key, "key has no path segments"));
    }
    Ok(relative)
}
