use drive_summarizer::{
    ArtifactPayload, FolderCollector, ImageProcessor, Modality, Processor, ProcessorRegistry,
    TextProcessor,
};
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 128]));
    img.save_with_format(path, ImageFormat::Png).expect("write png");
}

#[test]
fn test_collects_supported_files_in_order() {
    init_tracing();
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("b.md"), "# Notes\nsecond").unwrap();
    fs::write(dir.path().join("a.txt"), "first").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("c.csv"), "x,y\n1,2").unwrap();
    write_png(&dir.path().join("d.PNG"), 8, 8);

    let folder = FolderCollector::new(dir.path(), ProcessorRegistry::default())
        .collect()
        .expect("collect");

    let identifiers: Vec<&str> = folder.artifacts.iter().map(|a| a.identifier.as_str()).collect();
    info!("Collected: {:?}", identifiers);
    assert_eq!(identifiers, vec!["a.txt", "b.md", "d.PNG", "sub/c.csv"]);
    assert_eq!(folder.artifacts[0].payload, ArtifactPayload::Text("first".to_string()));
    assert_eq!(folder.artifacts[2].modality(), Modality::Image);
    assert!(folder.skipped.is_empty());
}

#[test]
fn test_unsupported_and_broken_files_are_skipped() {
    init_tracing();
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("archive.zip"), [0u8, 1, 2, 3]).unwrap();
    fs::write(dir.path().join("broken.pdf"), "this is not a pdf").unwrap();
    fs::write(dir.path().join("blank.txt"), "   \n").unwrap();
    fs::write(dir.path().join("fake.jpg"), "not an image").unwrap();
    fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
    fs::write(dir.path().join("ok.txt"), "kept").unwrap();

    let folder = FolderCollector::new(dir.path(), ProcessorRegistry::default())
        .collect()
        .expect("collect");

    assert_eq!(folder.artifacts.len(), 1);
    assert_eq!(folder.artifacts[0].identifier, "ok.txt");

    let skipped: Vec<&str> = folder.skipped.iter().map(|s| s.identifier.as_str()).collect();
    assert_eq!(skipped, vec!["archive.zip", "blank.txt", "broken.pdf", "fake.jpg"]);
    assert!(folder.skipped.iter().all(|s| !s.reason.is_empty()));
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("nope");

    let result = FolderCollector::new(&missing, ProcessorRegistry::default()).collect();

    assert!(result.is_err());
}

#[test]
fn test_text_decoding_fallbacks() {
    let (utf8, encoding) = TextProcessor::decode("привет".as_bytes());
    assert_eq!(utf8, "привет");
    assert_eq!(encoding, "utf-8");

    let (with_bom, _) = TextProcessor::decode(b"\xEF\xBB\xBFhello");
    assert_eq!(with_bom, "hello");

    // "привет" in Windows-1251
    let (cp1251, encoding) = TextProcessor::decode(&[0xEF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]);
    assert_eq!(cp1251, "привет");
    assert_eq!(encoding, "windows-1251");
}

#[test]
fn test_image_is_normalized_to_png() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("scan.bmp");
    RgbImage::from_pixel(10, 6, Rgb([200, 10, 10]))
        .save_with_format(&path, ImageFormat::Bmp)
        .unwrap();

    let payload = ImageProcessor::default().extract(&path).expect("extract");

    let ArtifactPayload::Image(png) = payload else {
        panic!("expected image payload");
    };
    assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    assert_eq!(image::load_from_memory(&png).unwrap().dimensions(), (10, 6));
}

#[test]
fn test_large_images_are_downscaled() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("wide.png");
    write_png(&path, 3200, 400);

    let png = ImageProcessor::new(false)
        .prepare(&fs::read(&path).unwrap())
        .expect("prepare");

    assert_eq!(image::load_from_memory(&png).unwrap().dimensions(), (1600, 200));
}

#[test]
fn test_registry_matches_extensions_case_insensitively() {
    let registry = ProcessorRegistry::default();

    assert!(registry.for_path(Path::new("REPORT.PDF")).is_some());
    assert!(registry.for_path(Path::new("photo.JpEg")).is_some());
    assert!(registry.for_path(Path::new("notes.rst")).is_some());
    assert!(registry.for_path(Path::new("Makefile")).is_none());
    assert!(registry.for_path(Path::new("slides.pptx")).is_none());

    let extensions = registry.extensions();
    assert!(extensions.contains(&"pdf".to_string()));
    assert!(extensions.contains(&"tif".to_string()));
}
