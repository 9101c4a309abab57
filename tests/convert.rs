use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;

use image_notes::config::Settings;
use image_notes::document::ImageAsset;
use image_notes::pipeline::{DocumentSynthesizer, Outcome};
use image_notes::vault::{FsVault, MemoryNotifier};

const GIF_1X1: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
];

fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

#[tokio::test]
async fn folder_conversion_on_disk() {
    let dir = TempDir::new().unwrap();
    let photos = dir.path().join("photos");
    fs::create_dir_all(photos.join("2024")).unwrap();
    fs::create_dir_all(dir.path().join("photos-old")).unwrap();
    fs::write(photos.join("a.png"), GIF_1X1).unwrap();
    fs::write(photos.join("b.txt"), b"not an image").unwrap();
    fs::write(photos.join("2024/c.JPEG"), GIF_1X1).unwrap();
    fs::write(dir.path().join("photos-old/d.gif"), GIF_1X1).unwrap();

    let settings = Settings {
        use_markdown_links: true,
        yaml_properties: "location:Berlin\nsource:scan".to_string(),
        ..Settings::default()
    };
    let settings_path = Settings::default_path(dir.path());
    settings.save(&settings_path).unwrap();
    let config = Settings::load(&settings_path).unwrap().configuration();

    let vault = FsVault::new(dir.path());
    let notifier = MemoryNotifier::new();
    let synth = DocumentSynthesizer::new(&vault, &notifier).with_clock(fixed_date);

    let outcomes = synth.convert_many("photos", &config).await;
    let paths: Vec<&str> = outcomes.iter().filter_map(Outcome::note_path).collect();
    assert_eq!(paths, vec!["photos/2024/c.md", "photos/a.md"]);

    assert_eq!(
        fs::read_to_string(photos.join("a.md")).unwrap(),
        "---\nlocation: Berlin\nsource: scan\ncreated: 2024-03-05\n---\n\n![a](photos/a.png)\n"
    );
    assert!(!dir.path().join("photos-old/d.md").exists());
    assert_eq!(notifier.messages().len(), 2);
}

#[tokio::test]
async fn second_run_leaves_notes_untouched() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("my photo.gif"), GIF_1X1).unwrap();

    let vault = FsVault::new(dir.path());
    let notifier = MemoryNotifier::new();
    let synth = DocumentSynthesizer::new(&vault, &notifier).with_clock(fixed_date);
    let config = Settings::default().configuration();
    let asset = ImageAsset::new("my photo.gif");

    let first = synth.convert_one(&asset, &config).await;
    assert!(matches!(&first, Outcome::Created(p) if p == "my photo.md"));

    let note = dir.path().join("my photo.md");
    fs::write(&note, "edited by hand").unwrap();

    let second = synth.convert_one(&asset, &config).await;
    assert!(matches!(second, Outcome::AlreadyExists(_)));
    assert_eq!(fs::read_to_string(&note).unwrap(), "edited by hand");
    assert_eq!(
        notifier.messages(),
        vec!["Created my photo.md", "my photo.md already exists"]
    );
}
