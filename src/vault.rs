//! Host capabilities the pipeline runs against.
//!
//! The conversion logic never touches the filesystem or the user directly.
//! It goes through a [`Vault`] (the document store) and a [`Notifier`]
//! (user-visible messages). [`FsVault`] and [`LogNotifier`] back the CLI;
//! [`MemoryVault`] and [`MemoryNotifier`] back the tests.
//!
//! Store paths are relative to the vault root and always use `/`.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// A file known to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub extension: String,
}

impl StoredFile {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let extension = Path::new(&path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        Self { path, extension }
    }
}

/// The document store a conversion reads images from and writes notes to.
///
/// Implement this trait to run the pipeline against another host.
#[async_trait::async_trait]
pub trait Vault: Send + Sync {
    /// Read the raw bytes of a stored file.
    async fn read_bytes(&self, path: &str) -> io::Result<Vec<u8>>;
    /// Whether anything exists at `path`.
    async fn exists(&self, path: &str) -> io::Result<bool>;
    /// Create a new file. Must fail rather than replace an existing one.
    async fn create_file(&self, path: &str, text: &str) -> io::Result<()>;
    /// Every file in the store, in a stable order.
    async fn list_all_files(&self) -> io::Result<Vec<StoredFile>>;
}

/// Fire-and-forget channel for user-visible messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

// ── Filesystem ───────────────────────────────────────────────────────

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Convert an on-disk path under the root into a store path.
    pub fn store_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }
}

#[async_trait::async_trait]
impl Vault for FsVault {
    async fn read_bytes(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path)).await
    }

    async fn exists(&self, path: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.resolve(path)).await
    }

    async fn create_file(&self, path: &str, text: &str) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        log::debug!("Created {}", full.display());
        Ok(())
    }

    async fn list_all_files(&self) -> io::Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.store_path(entry.path()) {
                Some(path) => files.push(StoredFile::new(path)),
                None => log::warn!("Skipping non UTF-8 path: {}", entry.path().display()),
            }
        }
        Ok(files)
    }
}

/// Reports every message through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("{message}");
    }
}

// ── In memory ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    writes: usize,
    read_only: bool,
}

/// A vault held entirely in memory.
///
/// Files list in path order. Handy for tests and for embedding the
/// pipeline where there is no real filesystem.
#[derive(Debug, Default)]
pub struct MemoryVault {
    state: Mutex<MemoryState>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.lock().files.insert(path.into(), bytes.into());
    }

    /// Contents of a file as text, if present.
    pub fn text(&self, path: &str) -> Option<String> {
        self.lock()
            .files
            .get(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Number of successful `create_file` calls so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Make every subsequent `create_file` fail with `PermissionDenied`.
    pub fn set_read_only(&self, read_only: bool) {
        self.lock().read_only = read_only;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Vault for MemoryVault {
    async fn read_bytes(&self, path: &str) -> io::Result<Vec<u8>> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }

    async fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.lock().files.contains_key(path))
    }

    async fn create_file(&self, path: &str, text: &str) -> io::Result<()> {
        let mut state = self.lock();
        if state.read_only {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "vault is read-only",
            ));
        }
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{path} already exists"),
            ));
        }
        state.files.insert(path.to_string(), text.as_bytes().to_vec());
        state.writes += 1;
        Ok(())
    }

    async fn list_all_files(&self) -> io::Result<Vec<StoredFile>> {
        Ok(self.lock().files.keys().cloned().map(StoredFile::new).collect())
    }
}

/// Collects messages instead of showing them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str) {
        let mut messages = self
            .messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        messages.push(message.to_string());
    }
}
