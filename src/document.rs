//! Pure note composition.
//!
//! Nothing here does I/O: given an image, its extracted metadata, the
//! configuration and a date, [`compose`] produces the exact note text.
//!
//! Frontmatter order is fixed:
//!
//! ```text
//! exif-height / exif-width    (only when dimensions are known)
//! exif-<tag>                  (extraction order)
//! <static property>           (configured order)
//! tags                        (only when configured)
//! created                     (YYYY-MM-DD)
//! ```

use chrono::NaiveDate;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Path;

use crate::config::Configuration;
use crate::exif::ExtractedMetadata;

/// Extension of generated notes.
pub const NOTE_EXTENSION: &str = "md";

const FRONTMATTER_DELIMITER: &str = "---";

/// Characters left as-is in markdown link targets: URI unreserved marks plus
/// the path separator.
const LINK_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'/');

/// An image in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    path: String,
    base_name: String,
}

impl ImageAsset {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let base_name = Path::new(&path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, base_name }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name without extension; names the note and labels its link.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Directory holding the image, `""` for the store root.
    ///
    /// `None` when the path does not name a file inside any directory.
    pub fn parent_dir(&self) -> Option<&str> {
        if self.base_name.is_empty() {
            return None;
        }
        Path::new(&self.path)
            .parent()
            .and_then(|p| p.to_str())
            .map(|p| p.trim_end_matches('/'))
    }
}

/// A finished note: frontmatter lines and a single body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocument {
    pub frontmatter_lines: Vec<String>,
    pub body: String,
}

impl ComposedDocument {
    /// Render as `---`, frontmatter, `---`, blank line, body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(FRONTMATTER_DELIMITER);
        out.push('\n');
        for line in &self.frontmatter_lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(FRONTMATTER_DELIMITER);
        out.push_str("\n\n");
        out.push_str(&self.body);
        out.push('\n');
        out
    }
}

/// Compose the note for `asset`.
pub fn compose(
    asset: &ImageAsset,
    metadata: &ExtractedMetadata,
    config: &Configuration,
    created: NaiveDate,
) -> ComposedDocument {
    let mut lines = Vec::new();

    if let Some(dims) = metadata.dimensions {
        lines.push(format!("exif-height: {}", dims.height));
        lines.push(format!("exif-width: {}", dims.width));
    }

    for (key, value) in &metadata.fields {
        lines.push(format!("exif-{key}: {value}"));
    }

    for (key, value) in &config.static_properties {
        lines.push(format!("{key}: {value}"));
    }

    if !config.tags.is_empty() {
        lines.push(format!("tags: [{}]", config.tags.join(", ")));
    }

    lines.push(format!("created: {}", created.format("%Y-%m-%d")));

    ComposedDocument {
        frontmatter_lines: lines,
        body: link(asset, config.use_markdown_links),
    }
}

/// Embed link to the image, markdown or wiki style.
pub fn link(asset: &ImageAsset, markdown: bool) -> String {
    if markdown {
        format!("![{}]({})", asset.base_name(), encode_path(asset.path()))
    } else {
        format!("![[{}]]", asset.path())
    }
}

/// Percent-encode a store path for use as a link target, keeping `/`.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, LINK_ENCODE_SET).to_string()
}

/// Where the note for `asset` goes: `<dir>/<base_name>.md`.
///
/// `dir` is the configured target directory when set, otherwise the image's
/// own directory. `None` if the image has no containing directory.
pub fn note_path(asset: &ImageAsset, config: &Configuration) -> Option<String> {
    let source_dir = asset.parent_dir()?;
    let dir = config.target_dir.as_deref().unwrap_or(source_dir);
    let file = format!("{}.{NOTE_EXTENSION}", asset.base_name());
    Some(join(dir, &file))
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
