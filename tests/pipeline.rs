//! End-to-end runs through the real codec backend and the filesystem.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use simple_thumbs::filters::Watermark;
use simple_thumbs::geometry::Position;
use simple_thumbs::naming::Rename;
use simple_thumbs::task::Phase;
use simple_thumbs::{ParameterError, ProgressEvent, ThumbnailError, Thumbnails};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tempfile::TempDir;

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    }))
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    gradient(width, height).save(&path).unwrap();
    path
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

// =========================================================================
// Files
// =========================================================================

#[test]
fn file_to_file_uses_destination_extension() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "photo.png", 200, 200);
    let dest = tmp.path().join("small.png");

    let written = Thumbnails::of_files([&src])
        .unwrap()
        .size(50, 50)
        .unwrap()
        .to_file(&dest)
        .unwrap();

    assert_eq!(written.as_deref(), Some(dest.as_path()));
    assert_eq!(dimensions(&dest), (50, 50));
    assert_eq!(
        image::ImageReader::open(&dest)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format(),
        Some(ImageFormat::Png)
    );
}

#[test]
fn explicit_format_appends_extension() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "photo.png", 120, 80);

    let written = Thumbnails::of_files([&src])
        .unwrap()
        .width(60)
        .unwrap()
        .output_format("jpg")
        .unwrap()
        .to_file(tmp.path().join("out.png"))
        .unwrap()
        .unwrap();

    assert_eq!(written, tmp.path().join("out.png.jpg"));
    assert_eq!(dimensions(&written), (60, 40));
}

#[test]
fn renamed_files_land_next_to_sources() {
    let tmp = TempDir::new().unwrap();
    let a = write_png(tmp.path(), "a.png", 300, 150);
    let b = write_png(tmp.path(), "b.png", 150, 300);

    let written = Thumbnails::of_files([&a, &b])
        .unwrap()
        .size(100, 100)
        .unwrap()
        .to_files_renamed(Rename::PrefixDotThumbnail)
        .unwrap();

    assert_eq!(
        written,
        vec![
            tmp.path().join("thumbnail.a.png"),
            tmp.path().join("thumbnail.b.png")
        ]
    );
    assert_eq!(dimensions(&written[0]), (100, 50));
    assert_eq!(dimensions(&written[1]), (50, 100));
}

#[test]
fn directory_output_is_created() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "a.png", 64, 64);
    let out = tmp.path().join("thumbs").join("nested");

    let written = Thumbnails::of_files([&src])
        .unwrap()
        .scale(0.5)
        .unwrap()
        .to_directory(&out, Rename::SuffixHyphenThumbnail)
        .unwrap();

    assert_eq!(written, vec![out.join("a-thumbnail.png")]);
    assert_eq!(dimensions(&written[0]), (32, 32));
}

#[test]
fn crop_fills_the_exact_box() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "wide.png", 400, 100);

    let written = Thumbnails::of_files([&src])
        .unwrap()
        .size(50, 50)
        .unwrap()
        .crop(Position::Center)
        .unwrap()
        .to_file(tmp.path().join("square.png"))
        .unwrap()
        .unwrap();

    assert_eq!(dimensions(&written), (50, 50));
}

// =========================================================================
// Cardinality
// =========================================================================

#[test]
fn two_sources_into_one_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let a = write_png(tmp.path(), "a.png", 10, 10);
    let b = write_png(tmp.path(), "b.png", 10, 10);

    let err = Thumbnails::of_files([&a, &b])
        .unwrap()
        .size(5, 5)
        .unwrap()
        .to_file(tmp.path().join("out.png"))
        .unwrap_err();

    assert!(matches!(
        err,
        ThumbnailError::Parameter(ParameterError::MultipleToOneFile)
    ));
    assert_eq!(err.to_string(), "Cannot output multiple thumbnails to one file.");
    assert!(!tmp.path().join("out.png").exists());
}

#[test]
fn short_name_sequence_writes_what_it_can() {
    let tmp = TempDir::new().unwrap();
    let a = write_png(tmp.path(), "a.png", 20, 20);
    let b = write_png(tmp.path(), "b.png", 20, 20);
    let first = tmp.path().join("first.png");

    let err = Thumbnails::of_files([&a, &b])
        .unwrap()
        .size(10, 10)
        .unwrap()
        .to_files([&first])
        .unwrap_err();

    assert!(matches!(err, ThumbnailError::NotEnoughNames { index: 1 }));
    assert!(first.exists());
}

#[test]
fn missing_size_fails_before_reading() {
    let err = Thumbnails::of_files(["/does/not/exist.png"])
        .unwrap()
        .as_image()
        .unwrap_err();
    assert!(matches!(
        err,
        ThumbnailError::Parameter(ParameterError::SizeNotSet)
    ));
}

// =========================================================================
// Overwrite policy
// =========================================================================

#[test]
fn existing_destination_is_kept_when_overwrite_disabled() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "a.png", 100, 100);
    let dest = tmp.path().join("thumb.png");
    std::fs::write(&dest, b"keep me").unwrap();

    let written = Thumbnails::of_files([&src])
        .unwrap()
        .size(10, 10)
        .unwrap()
        .allow_overwrite(false)
        .to_file(&dest)
        .unwrap();

    assert_eq!(written, None);
    assert_eq!(std::fs::read(&dest).unwrap(), b"keep me");
}

#[test]
fn existing_destination_is_replaced_by_default() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "a.png", 100, 100);
    let dest = tmp.path().join("thumb.png");
    std::fs::write(&dest, b"stale").unwrap();

    Thumbnails::of_files([&src])
        .unwrap()
        .size(10, 10)
        .unwrap()
        .to_file(&dest)
        .unwrap();

    assert_eq!(dimensions(&dest), (10, 10));
}

// =========================================================================
// Streams and memory
// =========================================================================

#[test]
fn reader_to_writer_needs_explicit_format() {
    let mut png = Vec::new();
    gradient(80, 40)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let err = Thumbnails::of_readers([Cursor::new(png.clone())])
        .unwrap()
        .size(20, 20)
        .unwrap()
        .to_writer(Vec::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ThumbnailError::Parameter(ParameterError::OutputFormatNotSpecified)
    ));

    let mut out = Vec::new();
    Thumbnails::of_readers([Cursor::new(png)])
        .unwrap()
        .size(20, 20)
        .unwrap()
        .output_format("jpeg")
        .unwrap()
        .output_quality(0.7)
        .unwrap()
        .to_writer(&mut out)
        .unwrap();

    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));
    assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
}

#[test]
fn watermark_is_drawn_into_the_corner() {
    let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
    let mark = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
    let watermark = Watermark::new(Position::BottomRight, &mark, 1.0).unwrap();

    let thumb = Thumbnails::of_images([base])
        .unwrap()
        .size(50, 50)
        .unwrap()
        .watermark(watermark)
        .as_image()
        .unwrap()
        .to_rgb8();

    assert_eq!((thumb.width(), thumb.height()), (50, 50));
    assert_eq!(thumb.get_pixel(49, 49), &Rgb([255, 255, 255]));
    assert_eq!(thumb.get_pixel(0, 0), &Rgb([0, 0, 0]));
}

// =========================================================================
// Listener
// =========================================================================

#[test]
fn listener_sees_phases_in_order() {
    let tmp = TempDir::new().unwrap();
    let src = write_png(tmp.path(), "a.png", 64, 64);
    let dest = tmp.path().join("b.png");
    let (tx, rx) = mpsc::channel();

    Thumbnails::of_files([&src])
        .unwrap()
        .size(16, 16)
        .unwrap()
        .listener(tx)
        .to_file(&dest)
        .unwrap();

    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Finished {
            source: src.display().to_string(),
            destination: dest.display().to_string(),
        })
    );

    let completed: Vec<Phase> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Phase {
                phase, progress, ..
            } if *progress >= 1.0 => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![Phase::Acquire, Phase::Resize, Phase::Filter, Phase::Output]
    );
}

#[test]
fn listener_sees_failure_for_undecodable_file() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("broken.png");
    std::fs::write(&src, b"not an image at all").unwrap();
    let (tx, rx) = mpsc::channel();

    let err = Thumbnails::of_files([&src])
        .unwrap()
        .size(16, 16)
        .unwrap()
        .listener(tx)
        .to_file(tmp.path().join("out.png"))
        .unwrap_err();

    assert!(matches!(err, ThumbnailError::Task(_)));
    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Failed {
            phase: Phase::Acquire,
            ..
        })
    ));
    assert!(!tmp.path().join("out.png").exists());
}
