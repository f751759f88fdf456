//! Where finished thumbnails go.

use crate::imaging::{BackendError, ImageBackend, Quality, format_name};
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output format not specified.")]
    FormatNotSpecified,
}

/// The encoding a sink should use, resolved by the task.
#[derive(Debug, Clone, Copy)]
pub struct Encoding {
    pub format: Option<ImageFormat>,
    pub quality: Option<Quality>,
}

/// A destination for one thumbnail.
pub trait ImageSink {
    /// What a successful write hands back to the caller.
    type Output;

    fn name(&self) -> String;

    /// Format implied by the destination itself, such as a file extension.
    fn preferred_format(&self) -> Option<ImageFormat> {
        None
    }

    fn write(
        &mut self,
        image: DynamicImage,
        encoding: Encoding,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Self::Output, SinkError>;
}

/// Write `data` in chunks, reporting the fraction written.
fn write_chunked(
    mut writer: impl Write,
    data: &[u8],
    progress: &mut dyn FnMut(f32),
) -> std::io::Result<()> {
    let total = data.len().max(1) as f64;
    let mut written = 0;
    for chunk in data.chunks(CHUNK_SIZE) {
        writer.write_all(chunk)?;
        written += chunk.len();
        progress(((written as f64 / total).min(0.99)) as f32);
    }
    writer.flush()
}

fn encode(
    image: &DynamicImage,
    encoding: Encoding,
    backend: &dyn ImageBackend,
) -> Result<Vec<u8>, SinkError> {
    let format = encoding.format.ok_or(SinkError::FormatNotSpecified)?;
    Ok(backend.encode(image, format, encoding.quality)?)
}

// ============================================================================
// In memory
// ============================================================================

/// Keeps the thumbnail as a bitmap; nothing is encoded.
#[derive(Debug, Default)]
pub struct BitmapSink;

impl ImageSink for BitmapSink {
    type Output = DynamicImage;

    fn name(&self) -> String {
        "memory".to_string()
    }

    fn write(
        &mut self,
        image: DynamicImage,
        _encoding: Encoding,
        _backend: &dyn ImageBackend,
        _progress: &mut dyn FnMut(f32),
    ) -> Result<DynamicImage, SinkError> {
        Ok(image)
    }
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// A file destination for thumbnails encoded as `explicit_format`, or as
    /// implied by the extension when no format is set.
    ///
    /// When the extension names a different format than `explicit_format`
    /// (or there is none), the format's extension is appended:
    /// `thumb.png` with JPEG output becomes `thumb.png.jpg`.
    pub fn new(path: impl Into<PathBuf>, explicit_format: Option<ImageFormat>) -> Self {
        let path = path.into();
        let path = match explicit_format {
            Some(format) if !extension_matches(&path, format) => {
                let mut name = path.clone().into_os_string();
                name.push(".");
                name.push(format_name(format));
                PathBuf::from(name)
            }
            _ => path,
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn extension_matches(path: &Path, format: ImageFormat) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            format
                .extensions_str()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

impl ImageSink for FileSink {
    type Output = PathBuf;

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn preferred_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_path(&self.path)
            .ok()
            .filter(|f| f.writing_enabled())
    }

    fn write(
        &mut self,
        image: DynamicImage,
        encoding: Encoding,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<PathBuf, SinkError> {
        let data = encode(&image, encoding, backend)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_chunked(fs::File::create(&self.path)?, &data, progress)?;
        debug!(path = %self.path.display(), bytes = data.len(), "wrote thumbnail");
        Ok(self.path.clone())
    }
}

// ============================================================================
// Streams
// ============================================================================

/// Any byte stream. Requires an explicit output format.
pub struct WriterSink<W> {
    writer: W,
    index: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, index: usize) -> Self {
        Self { writer, index }
    }
}

impl<W: Write> ImageSink for WriterSink<W> {
    type Output = ();

    fn name(&self) -> String {
        format!("stream #{}", self.index)
    }

    fn write(
        &mut self,
        image: DynamicImage,
        encoding: Encoding,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<(), SinkError> {
        let data = encode(&image, encoding, backend)?;
        write_chunked(&mut self.writer, &data, progress)?;
        Ok(())
    }
}
