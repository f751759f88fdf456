//! Where original images come from.
//!
//! Every source yields a [`Decoded`] bitmap plus the identity used in
//! progress events and errors. Progress callbacks receive values in
//! `[0.0, 1.0)`; the task reports completion itself.

use crate::imaging::{BackendError, Decoded, ImageBackend};
use image::DynamicImage;
use image::metadata::Orientation;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read size for sources that report progress per chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// An original image, read exactly once by a task.
pub trait ImageSource {
    /// Identity of this source in events and errors.
    fn name(&self) -> String;

    /// Read and decode the image.
    fn acquire(
        &mut self,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Decoded, BackendError>;

    /// The file behind this source, if any.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Read everything from `reader`, reporting progress against `total` bytes.
fn read_chunked(
    mut reader: impl Read,
    total: Option<u64>,
    progress: &mut dyn FnMut(f32),
) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Ok(data);
        }
        data.extend_from_slice(&chunk[..n]);
        if let Some(total) = total.filter(|&t| t > 0) {
            let fraction = data.len() as f64 / total as f64;
            progress(fraction.min(0.99) as f32);
        }
    }
}

// ============================================================================
// In-memory bitmaps
// ============================================================================

/// A bitmap that is already decoded. Its orientation is taken as upright.
#[derive(Debug)]
pub struct BitmapSource {
    image: Option<DynamicImage>,
    index: usize,
}

impl BitmapSource {
    pub fn new(image: DynamicImage, index: usize) -> Self {
        Self {
            image: Some(image),
            index,
        }
    }
}

impl ImageSource for BitmapSource {
    fn name(&self) -> String {
        format!("image #{}", self.index)
    }

    fn acquire(
        &mut self,
        _backend: &dyn ImageBackend,
        _progress: &mut dyn FnMut(f32),
    ) -> Result<Decoded, BackendError> {
        let image = self
            .image
            .take()
            .ok_or_else(|| BackendError::Decode(format!("{} was already read", self.name())))?;
        Ok(Decoded {
            image,
            format: None,
            orientation: Orientation::NoTransforms,
        })
    }
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn acquire(
        &mut self,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Decoded, BackendError> {
        let file = File::open(&self.path)?;
        let total = file.metadata().ok().map(|m| m.len());
        let data = read_chunked(file, total, progress)?;
        debug!(path = %self.path.display(), bytes = data.len(), "read source file");
        backend.decode(&data)
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

// ============================================================================
// Streams
// ============================================================================

/// Any byte stream. Its length is unknown, so no intermediate progress.
pub struct ReaderSource<R> {
    reader: R,
    index: usize,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, index: usize) -> Self {
        Self { reader, index }
    }
}

impl<R: Read> ImageSource for ReaderSource<R> {
    fn name(&self) -> String {
        format!("stream #{}", self.index)
    }

    fn acquire(
        &mut self,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Decoded, BackendError> {
        let data = read_chunked(&mut self.reader, None, progress)?;
        backend.decode(&data)
    }
}

// ============================================================================
// URLs
// ============================================================================

/// An image fetched over HTTP(S) with a blocking client.
#[derive(Debug, Clone)]
pub struct UrlSource {
    url: String,
}

impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn fetch_error(&self, err: impl ToString) -> BackendError {
        BackendError::Fetch {
            url: self.url.clone(),
            message: err.to_string(),
        }
    }
}

impl ImageSource for UrlSource {
    fn name(&self) -> String {
        self.url.clone()
    }

    fn acquire(
        &mut self,
        backend: &dyn ImageBackend,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Decoded, BackendError> {
        let response = reqwest::blocking::get(&self.url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.fetch_error(e))?;
        let total = response.content_length();
        let data = read_chunked(response, total, progress).map_err(|e| self.fetch_error(e))?;
        debug!(url = %self.url, bytes = data.len(), "fetched source");
        backend.decode(&data)
    }
}
