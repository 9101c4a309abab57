use nom_exif::{EntryValue, ExifIter, MediaParser, MediaSource};
use std::io::Cursor;

use super::ExtractError;

// Exif sub-IFD pixel dimension tags
const TAG_PIXEL_X_DIMENSION: u16 = 0xA002;
const TAG_PIXEL_Y_DIMENSION: u16 = 0xA003;

/// Pixel dimensions reported by the image's embedded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Flattened embedded metadata of one image.
///
/// `fields` keeps the order in which the parser discovered the tags, so the
/// same bytes always produce the same sequence. Pixel dimensions, when the
/// image carries both of them, live in `dimensions` and are not repeated in
/// `fields`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub dimensions: Option<Dimensions>,
    pub fields: Vec<(String, String)>,
}

impl ExtractedMetadata {
    /// Look up a flattened field by tag name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_none() && self.fields.is_empty()
    }
}

/// Extract embedded metadata from raw image bytes.
///
/// Images that simply carry no metadata (GIF, most PNGs, stripped JPEGs)
/// yield an empty [`ExtractedMetadata`]. Only bytes that are not a
/// recognizable image container at all are an error; a known magic header
/// followed by garbage counts as "no metadata", not as a failure.
pub fn extract(bytes: &[u8]) -> Result<ExtractedMetadata, ExtractError> {
    let iter = match parse_exif(bytes) {
        Ok(iter) => iter,
        Err(e) => {
            return match image::guess_format(bytes) {
                Ok(format) => {
                    log::debug!("No EXIF data found in {format:?} image: {e}");
                    Ok(ExtractedMetadata::default())
                }
                Err(_) => Err(ExtractError::Unrecognized(e.to_string())),
            };
        }
    };

    let mut fields: Vec<(String, String)> = Vec::new();
    // (index in fields, value)
    let mut width: Option<(usize, u32)> = None;
    let mut height: Option<(usize, u32)> = None;

    for entry in iter {
        let Some(value) = entry.get_value().and_then(entry_to_string) else {
            continue;
        };

        let key = match entry.tag() {
            Some(tag) => format!("{tag:?}"),
            None => format!("0x{:04x}", entry.tag_code()),
        };

        // IFD1 (thumbnail) repeats several IFD0 tags
        if fields.iter().any(|(k, _)| *k == key) {
            continue;
        }

        match entry.tag_code() {
            TAG_PIXEL_X_DIMENSION if width.is_none() => {
                width = value.parse::<u32>().ok().map(|w| (fields.len(), w));
            }
            TAG_PIXEL_Y_DIMENSION if height.is_none() => {
                height = value.parse::<u32>().ok().map(|h| (fields.len(), h));
            }
            _ => {}
        }
        fields.push((key, value));
    }

    // A lone dimension stays where it was found.
    let dimensions = match (width, height) {
        (Some((wi, width)), Some((hi, height))) => {
            fields.remove(wi.max(hi));
            fields.remove(wi.min(hi));
            Some(Dimensions { width, height })
        }
        _ => None,
    };

    log::debug!(
        "Extracted {} EXIF field(s), dimensions: {:?}",
        fields.len(),
        dimensions
    );

    Ok(ExtractedMetadata { dimensions, fields })
}

fn parse_exif(bytes: &[u8]) -> Result<ExifIter, nom_exif::Error> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(Cursor::new(bytes))?;
    parser.parse(ms)
}

/// Render an EntryValue as a single trimmed line, or `None` if it is blank.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s
        .trim()
        .trim_matches('"')
        .trim_end_matches('\0')
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if s.is_empty() { None } else { Some(s) }
}
