//! # image-notes
//!
//! Turn images into Markdown notes. Each note carries the image's embedded
//! EXIF metadata and user-defined static properties as frontmatter, and an
//! embed link back to the image as its body.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_notes::config::Settings;
//! use image_notes::document::ImageAsset;
//! use image_notes::pipeline::{DocumentSynthesizer, Outcome};
//! use image_notes::vault::{FsVault, LogNotifier};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let vault = FsVault::new("./vault");
//!     let settings = Settings::load(&Settings::default_path(vault.root()))?;
//!     let config = settings.configuration();
//!
//!     let notifier = LogNotifier;
//!     let synthesizer = DocumentSynthesizer::new(&vault, &notifier);
//!
//!     // One image
//!     let outcome = synthesizer
//!         .convert_one(&ImageAsset::new("photos/sunset.jpg"), &config)
//!         .await;
//!     if let Outcome::Created(path) = &outcome {
//!         println!("Wrote {path}");
//!     }
//!
//!     // A whole folder
//!     let outcomes = synthesizer.convert_many("photos", &config).await;
//!     println!("{} image(s) processed", outcomes.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! A note for `photos/sunset.jpg` (1920×1080, static property
//! `location:Berlin`, markdown links) lands at `photos/sunset.md`:
//!
//! ```text
//! ---
//! exif-height: 1080
//! exif-width: 1920
//! location: Berlin
//! created: 2024-03-05
//! ---
//!
//! ![sunset](photos/sunset.jpg)
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Persisted settings and the derived conversion configuration
//! - [`document`] — Pure note composition (frontmatter, links, target paths)
//! - [`exif`] — Embedded metadata extraction
//! - [`pipeline`] — Single-image and folder conversion
//! - [`vault`] — Store and notification capabilities, with disk and in-memory backends

pub mod config;
pub mod document;
pub mod exif;
pub mod pipeline;
pub mod vault;
