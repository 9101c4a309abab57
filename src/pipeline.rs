use chrono::NaiveDate;
use std::fmt;
use std::io;
use std::path::Path;

use crate::config::Configuration;
use crate::document::{self, ImageAsset};
use crate::exif;
use crate::vault::{Notifier, StoredFile, Vault};

/// Image extensions that can be turned into notes.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Why a single conversion could not produce a note.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{0} is not inside a folder")]
    NoParentDirectory(String),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Terminal result of converting one image.
#[derive(Debug)]
pub enum Outcome {
    /// A new note was written at this path.
    Created(String),
    /// A note already exists at this path; nothing was written.
    AlreadyExists(String),
    Failed(ConvertError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The note path, for outcomes that have one.
    pub fn note_path(&self) -> Option<&str> {
        match self {
            Self::Created(p) | Self::AlreadyExists(p) => Some(p),
            Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(path) => write!(f, "Created {path}"),
            Self::AlreadyExists(path) => write!(f, "{path} already exists"),
            Self::Failed(err) => write!(f, "Error: {err}"),
        }
    }
}

/// Check if a path has a convertible image extension (case-insensitive).
pub fn is_supported_image(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(is_supported_extension)
        .unwrap_or(false)
}

fn is_supported_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Whether `path` lies inside `folder` (at any depth), compared by whole
/// path segments. The empty folder is the store root.
pub fn is_within(folder: &str, path: &str) -> bool {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        return true;
    }
    path.trim_start_matches('/')
        .strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Turns images in a [`Vault`] into notes, reporting every outcome to a
/// [`Notifier`].
///
/// Conversions run strictly one after another; the batch path awaits each
/// image before starting the next, so notes appear in listing order and two
/// conversions never race on the same target.
///
/// # Example
///
/// ```rust,no_run
/// use image_notes::config::Settings;
/// use image_notes::pipeline::DocumentSynthesizer;
/// use image_notes::vault::{FsVault, LogNotifier};
///
/// # async fn example() -> anyhow::Result<()> {
/// let vault = FsVault::new("./vault");
/// let notifier = LogNotifier;
/// let config = Settings::load("./vault/.image-notes.json".as_ref())?.configuration();
///
/// let synthesizer = DocumentSynthesizer::new(&vault, &notifier);
/// for outcome in synthesizer.convert_many("photos", &config).await {
///     println!("{outcome}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct DocumentSynthesizer<'a> {
    vault: &'a dyn Vault,
    notifier: &'a dyn Notifier,
    today: fn() -> NaiveDate,
}

impl<'a> DocumentSynthesizer<'a> {
    pub fn new(vault: &'a dyn Vault, notifier: &'a dyn Notifier) -> Self {
        Self {
            vault,
            notifier,
            today: || chrono::Local::now().date_naive(),
        }
    }

    /// Use a fixed clock for the `created` date.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Convert one image into a note next to it (or in the target directory).
    ///
    /// Never overwrites: an existing note yields [`Outcome::AlreadyExists`].
    /// The outcome is also sent to the notifier.
    pub async fn convert_one(&self, asset: &ImageAsset, config: &Configuration) -> Outcome {
        let outcome = self.try_convert(asset, config).await;
        log::debug!("{}: {outcome}", asset.path());
        self.notifier.notify(&outcome.to_string());
        outcome
    }

    async fn try_convert(&self, asset: &ImageAsset, config: &Configuration) -> Outcome {
        let Some(target) = document::note_path(asset, config) else {
            return Outcome::Failed(ConvertError::NoParentDirectory(asset.path().to_string()));
        };

        let bytes = match self.vault.read_bytes(asset.path()).await {
            Ok(bytes) => bytes,
            Err(source) => {
                return Outcome::Failed(ConvertError::ReadFailed {
                    path: asset.path().to_string(),
                    source,
                });
            }
        };

        let metadata = match exif::extract(&bytes) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Failed to read EXIF from {}: {e}", asset.path());
                exif::ExtractedMetadata::default()
            }
        };

        let doc = document::compose(asset, &metadata, config, (self.today)());

        match self.vault.exists(&target).await {
            Ok(true) => return Outcome::AlreadyExists(target),
            Ok(false) => {}
            Err(source) => {
                return Outcome::Failed(ConvertError::ReadFailed {
                    path: target,
                    source,
                });
            }
        }

        match self.vault.create_file(&target, &doc.render()).await {
            Ok(()) => Outcome::Created(target),
            // Lost a race with another writer; still no overwrite.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Outcome::AlreadyExists(target),
            Err(source) => Outcome::Failed(ConvertError::WriteFailed {
                path: target,
                source,
            }),
        }
    }

    /// Convert every supported image inside `folder`, in listing order.
    ///
    /// A failing image does not stop the batch; each gets its own outcome.
    /// If the store cannot be listed at all, that single failure is reported
    /// and the result is empty.
    pub async fn convert_many(&self, folder: &str, config: &Configuration) -> Vec<Outcome> {
        let files = match self.vault.list_all_files().await {
            Ok(files) => files,
            Err(e) => {
                log::error!("Failed to list files: {e}");
                self.notifier.notify(&format!("Error: failed to list files: {e}"));
                return Vec::new();
            }
        };

        let images = collect_images(folder, &files);
        log::info!("Found {} image(s) in {}", images.len(), display_folder(folder));

        let mut outcomes = Vec::with_capacity(images.len());
        for (i, asset) in images.iter().enumerate() {
            log::debug!("[{}/{}] Converting: {}", i + 1, images.len(), asset.path());
            outcomes.push(self.convert_one(asset, config).await);
        }
        outcomes
    }
}

/// Supported images among `files` that lie inside `folder`.
pub fn collect_images(folder: &str, files: &[StoredFile]) -> Vec<ImageAsset> {
    files
        .iter()
        .filter(|f| is_within(folder, &f.path))
        .filter(|f| is_supported_extension(&f.extension))
        .map(|f| ImageAsset::new(f.path.clone()))
        .collect()
}

fn display_folder(folder: &str) -> &str {
    if folder.trim_matches('/').is_empty() { "/" } else { folder }
}
