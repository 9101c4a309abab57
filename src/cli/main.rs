use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use image_notes::config::Settings;
use image_notes::document::ImageAsset;
use image_notes::exif;
use image_notes::pipeline::{self, DocumentSynthesizer, Outcome};
use image_notes::vault::{FsVault, LogNotifier};

#[derive(Parser, Debug)]
#[command(
    name = "image-notes",
    version,
    about = "Turn images into Markdown notes with EXIF frontmatter and an embed link"
)]
struct Cli {
    /// Root directory of the note vault
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    vault: PathBuf,

    /// Path to settings file (default: .image-notes.json in the vault)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an image, or every image in a folder, into notes
    Convert {
        /// Image file or folder, relative to the vault root
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display the metadata a note would be built from and exit
    Inspect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Write default settings and exit
    Init,
    /// Change one setting
    Set {
        field: Field,
        value: String,
    },
    /// Clear an optional setting
    Unset { field: Field },
    /// Print the current settings
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Field {
    /// Use markdown links (true/false) instead of wiki embeds
    Links,
    /// Static properties, one key:value per line
    Properties,
    /// Comma-separated tags
    Tags,
    /// Directory notes are written to instead of next to the image
    Target,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Settings::default_path(&cli.vault));

    match cli.command {
        Command::Init => {
            Settings::default().save(&settings_path)?;
            println!("Default settings written to {}", settings_path.display());
        }
        Command::Show => {
            let settings = Settings::load(&settings_path)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Set { field, value } => {
            let mut settings = Settings::load(&settings_path)?;
            apply(&mut settings, field, Some(value))?;
            settings.save(&settings_path)?;
        }
        Command::Unset { field } => {
            let mut settings = Settings::load(&settings_path)?;
            apply(&mut settings, field, None)?;
            settings.save(&settings_path)?;
        }
        Command::Inspect { path } => {
            print_metadata(&cli.vault.join(&path))?;
        }
        Command::Convert { path, json } => {
            let settings = Settings::load(&settings_path)?;
            convert(&cli.vault, &path, &settings, json).await?;
        }
    }

    Ok(())
}

/// Edit one settings field. `None` resets it.
fn apply(settings: &mut Settings, field: Field, value: Option<String>) -> Result<()> {
    match field {
        Field::Links => {
            settings.use_markdown_links = match value.as_deref() {
                Some(v) => v
                    .parse()
                    .with_context(|| format!("Expected true or false, got {v:?}"))?,
                None => false,
            };
        }
        // Shells make real newlines awkward; accept a literal \n too.
        Field::Properties => {
            settings.yaml_properties = value.unwrap_or_default().replace("\\n", "\n");
        }
        Field::Tags => settings.tags = value.filter(|v| !v.trim().is_empty()),
        Field::Target => settings.target_path = value.filter(|v| !v.trim().is_empty()),
    }
    Ok(())
}

async fn convert(vault_root: &Path, path: &Path, settings: &Settings, json: bool) -> Result<()> {
    let root = std::fs::canonicalize(vault_root)
        .with_context(|| format!("Vault not found: {}", vault_root.display()))?;
    let full = std::fs::canonicalize(root.join(path))
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    let vault = FsVault::new(root);
    let store_path = vault
        .store_path(&full)
        .with_context(|| format!("{} is not inside the vault", path.display()))?;

    let config = settings.configuration();
    let notifier = LogNotifier;
    let synthesizer = DocumentSynthesizer::new(&vault, &notifier);

    let outcomes = if full.is_dir() {
        synthesizer.convert_many(&store_path, &config).await
    } else if full.is_file() {
        if !pipeline::is_supported_image(&store_path) {
            anyhow::bail!(
                "{} is not a supported image ({})",
                path.display(),
                pipeline::IMAGE_EXTENSIONS.join(", ")
            );
        }
        vec![
            synthesizer
                .convert_one(&ImageAsset::new(store_path), &config)
                .await,
        ]
    } else {
        anyhow::bail!("Not a file or folder: {}", full.display());
    };

    if json {
        let json_results: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| match o {
                Outcome::Created(p) => serde_json::json!({ "status": "created", "path": p }),
                Outcome::AlreadyExists(p) => serde_json::json!({ "status": "exists", "path": p }),
                Outcome::Failed(e) => serde_json::json!({ "status": "failed", "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    // Summary
    let created = outcomes.iter().filter(|o| matches!(o, Outcome::Created(_))).count();
    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    log::info!(
        "Done: {created} created, {} skipped, {failed} failed out of {} images",
        outcomes.len() - created - failed,
        outcomes.len()
    );

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print the extracted metadata of one file.
fn print_metadata(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).context("Failed to read image file")?;
    let data = exif::extract(&bytes)?;

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if let Some(dims) = data.dimensions {
        print_row("exif-height", &dims.height.to_string());
        print_row("exif-width", &dims.width.to_string());
    }
    for (tag, val) in &data.fields {
        print_row(&format!("exif-{tag}"), val);
    }

    if data.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
    }
    println!();

    Ok(())
}

/// Print a single row in the metadata table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_splits_long_values() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_text_keeps_blank() {
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn apply_links_parses_bool() {
        let mut settings = Settings::default();
        apply(&mut settings, Field::Links, Some("true".to_string())).unwrap();
        assert!(settings.use_markdown_links);
        assert!(apply(&mut settings, Field::Links, Some("yes".to_string())).is_err());
    }

    #[test]
    fn apply_properties_unescapes_newlines() {
        let mut settings = Settings::default();
        apply(&mut settings, Field::Properties, Some("a:1\\nb:2".to_string())).unwrap();
        assert_eq!(settings.yaml_properties, "a:1\nb:2");
    }

    #[test]
    fn unset_target() {
        let mut settings = Settings {
            target_path: Some("notes".to_string()),
            ..Settings::default()
        };
        apply(&mut settings, Field::Target, None).unwrap();
        assert!(settings.target_path.is_none());
    }
}
