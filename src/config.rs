use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default settings file name, placed at the root of the vault.
pub const SETTINGS_FILE: &str = ".image-notes.json";

/// Persisted user settings.
///
/// Stored as a flat JSON record. Every field falls back to its default when
/// missing, and unknown keys are ignored, so an old or partial file never
/// fails to load.
///
/// # Example
///
/// ```rust
/// use image_notes::config::Settings;
///
/// let settings: Settings = serde_json::from_str(r#"{"useMarkdownLinks": true}"#).unwrap();
/// assert!(settings.use_markdown_links);
/// assert!(settings.yaml_properties.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Emit `![name](path)` links instead of `![[path]]` wiki embeds.
    pub use_markdown_links: bool,
    /// Static frontmatter, one `key:value` per line.
    pub yaml_properties: String,
    /// Comma-separated tags added to every note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Write notes into this directory instead of next to the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

/// The settings a conversion actually runs with.
///
/// Built from [`Settings`] once and passed by reference into every
/// conversion; nothing in the pipeline mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub use_markdown_links: bool,
    pub static_properties: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub target_dir: Option<String>,
}

impl Settings {
    /// Resolve the settings file path for a vault root.
    pub fn default_path(vault_root: &Path) -> PathBuf {
        vault_root.join(SETTINGS_FILE)
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "Settings file not found at {}. Using defaults.",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Settings =
            serde_json::from_str(&contents).context("Failed to parse settings file")?;
        Ok(settings)
    }

    /// Save settings to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, contents).context("Failed to write settings file")?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Build the in-memory [`Configuration`] used by conversions.
    pub fn configuration(&self) -> Configuration {
        Configuration {
            use_markdown_links: self.use_markdown_links,
            static_properties: parse_properties(&self.yaml_properties),
            tags: self.tags.as_deref().map(parse_tags).unwrap_or_default(),
            target_dir: self
                .target_path
                .as_deref()
                .map(|p| p.trim().trim_matches('/'))
                .filter(|p| !p.is_empty())
                .map(String::from),
        }
    }
}

/// Parse a `key:value` per line blob into ordered properties.
///
/// Each non-blank line splits at its first colon; a line without one becomes
/// a key with an empty value. When a key repeats, the last value wins and
/// the key keeps the position of its first occurrence.
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut props: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once(':').unwrap_or((line, ""));
        let key = key.trim();
        let value = value.trim();

        match props.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.to_string(),
            None => props.push((key.to_string(), value.to_string())),
        }
    }

    props
}

fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── parse_properties ─────────────────────────────────────────────

    #[test]
    fn properties_in_order() {
        let props = parse_properties("location:Berlin\nsource: camera roll");
        assert_eq!(
            props,
            vec![
                ("location".to_string(), "Berlin".to_string()),
                ("source".to_string(), "camera roll".to_string()),
            ]
        );
    }

    #[test]
    fn properties_without_colon_get_empty_value() {
        let props = parse_properties("reviewed");
        assert_eq!(props, vec![("reviewed".to_string(), String::new())]);
    }

    #[test]
    fn properties_split_at_first_colon() {
        let props = parse_properties("url:https://example.com/a");
        assert_eq!(props[0].1, "https://example.com/a");
    }

    #[test]
    fn properties_skip_blank_lines() {
        let props = parse_properties("\na:1\n   \nb:2\n");
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn properties_last_write_wins() {
        let props = parse_properties("a:1\nb:2\na:3");
        assert_eq!(
            props,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    // ── Settings ─────────────────────────────────────────────────────

    #[test]
    fn settings_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"yamlProperties": "a:b"}"#).unwrap();
        assert!(!settings.use_markdown_links);
        assert_eq!(settings.yaml_properties, "a:b");
        assert!(settings.target_path.is_none());
    }

    #[test]
    fn settings_ignore_unknown_keys() {
        let json = r#"{"useMarkdownLinks": true, "templatePath": "tpl.md", "other": 1}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.use_markdown_links);
    }

    #[test]
    fn settings_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn settings_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = Settings::default_path(dir.path());
        let settings = Settings {
            use_markdown_links: true,
            yaml_properties: "location:Berlin".to_string(),
            tags: Some("photo, travel".to_string()),
            target_path: Some("notes".to_string()),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn settings_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    // ── configuration ────────────────────────────────────────────────

    #[test]
    fn configuration_from_settings() {
        let settings = Settings {
            use_markdown_links: true,
            yaml_properties: "location:Berlin".to_string(),
            tags: Some("#photo, travel,".to_string()),
            target_path: Some("/notes/images/".to_string()),
        };
        let config = settings.configuration();
        assert!(config.use_markdown_links);
        assert_eq!(
            config.static_properties,
            vec![("location".to_string(), "Berlin".to_string())]
        );
        assert_eq!(config.tags, vec!["photo", "travel"]);
        assert_eq!(config.target_dir.as_deref(), Some("notes/images"));
    }

    #[test]
    fn configuration_blank_target_is_none() {
        let settings = Settings {
            target_path: Some("  ".to_string()),
            ..Settings::default()
        };
        assert!(settings.configuration().target_dir.is_none());
    }
}
