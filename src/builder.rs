//! The public entry point: pick sources, configure, then call one terminal.
//!
//! ```no_run
//! # use simple_thumbs::Thumbnails;
//! # fn main() -> Result<(), simple_thumbs::ThumbnailError> {
//! Thumbnails::of_files(["photo.jpg"])?
//!     .size(160, 160)?
//!     .output_quality(0.8)?
//!     .to_file("photo-small.jpg")?;
//! # Ok(())
//! # }
//! ```
//!
//! Setters fail as soon as an option conflicts with one already given.
//! Terminals consume the builder, freeze its settings into one
//! [`ThumbnailParameter`] and then run one task per source, in source order.
//! Cardinality and format problems are reported before any task starts; the
//! first task failure aborts the rest of the batch.

use crate::filters::{ImageFilter, Watermark};
use crate::geometry::{Position, Region};
use crate::imaging::{ImageBackend, PixelFormat, Resizer, RustBackend, ScalingMode};
use crate::naming::Rename;
use crate::parameter::{ParameterBuilder, ParameterError, ThumbnailParameter};
use crate::sink::{BitmapSink, FileSink, ImageSink, WriterSink};
use crate::source::{BitmapSource, FileSource, ImageSource, ReaderSource, UrlSource};
use crate::task::{ProgressEvent, ProgressSink, TaskError, ThumbnailTask, TracingSink};
use image::DynamicImage;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("Not enough file names provided by iterator.")]
    NotEnoughNames { index: usize },
    #[error("Not enough output streams provided by iterator.")]
    NotEnoughStreams { index: usize },
}

/// Entry points, one per kind of source.
pub struct Thumbnails;

impl Thumbnails {
    pub fn of_images(
        images: impl IntoIterator<Item = DynamicImage>,
    ) -> Result<Builder<BitmapSource>, ThumbnailError> {
        Builder::new(
            images
                .into_iter()
                .enumerate()
                .map(|(i, img)| BitmapSource::new(img, i))
                .collect(),
        )
    }

    pub fn of_files<P: Into<PathBuf>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Builder<FileSource>, ThumbnailError> {
        Builder::new(paths.into_iter().map(FileSource::new).collect())
    }

    pub fn of_readers<R: Read>(
        readers: impl IntoIterator<Item = R>,
    ) -> Result<Builder<ReaderSource<R>>, ThumbnailError> {
        Builder::new(
            readers
                .into_iter()
                .enumerate()
                .map(|(i, r)| ReaderSource::new(r, i))
                .collect(),
        )
    }

    pub fn of_urls<U: Into<String>>(
        urls: impl IntoIterator<Item = U>,
    ) -> Result<Builder<UrlSource>, ThumbnailError> {
        Builder::new(urls.into_iter().map(UrlSource::new).collect())
    }
}

/// Accumulates settings for thumbnails of sources of type `S`.
pub struct Builder<S> {
    sources: Vec<S>,
    params: ParameterBuilder,
    allow_overwrite: bool,
    backend: Box<dyn ImageBackend + Send>,
    listener: Box<dyn ProgressSink + Send>,
}

impl<S: ImageSource> Builder<S> {
    fn new(sources: Vec<S>) -> Result<Self, ThumbnailError> {
        if sources.is_empty() {
            return Err(ParameterError::NoSources.into());
        }
        Ok(Self {
            sources,
            params: ParameterBuilder::new(),
            allow_overwrite: true,
            backend: Box::new(RustBackend::new()),
            listener: Box::new(TracingSink),
        })
    }

    fn set(
        mut self,
        apply: impl FnOnce(&mut ParameterBuilder) -> Result<(), ParameterError>,
    ) -> Result<Self, ThumbnailError> {
        apply(&mut self.params)?;
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn size(self, width: u32, height: u32) -> Result<Self, ThumbnailError> {
        self.set(|p| p.size(width, height))
    }

    pub fn width(self, width: u32) -> Result<Self, ThumbnailError> {
        self.set(|p| p.width(width))
    }

    pub fn height(self, height: u32) -> Result<Self, ThumbnailError> {
        self.set(|p| p.height(height))
    }

    pub fn force_size(self, width: u32, height: u32) -> Result<Self, ThumbnailError> {
        self.set(|p| p.force_size(width, height))
    }

    pub fn scale(self, factor: f64) -> Result<Self, ThumbnailError> {
        self.set(|p| p.scale(factor))
    }

    pub fn scale_xy(self, factor_x: f64, factor_y: f64) -> Result<Self, ThumbnailError> {
        self.set(|p| p.scale_xy(factor_x, factor_y))
    }

    pub fn keep_aspect_ratio(self, keep: bool) -> Result<Self, ThumbnailError> {
        self.set(|p| p.keep_aspect_ratio(keep))
    }

    pub fn resizer(self, resizer: Resizer) -> Result<Self, ThumbnailError> {
        self.set(|p| p.resizer(resizer))
    }

    pub fn scaling_mode(self, mode: ScalingMode) -> Result<Self, ThumbnailError> {
        self.set(|p| p.scaling_mode(mode))
    }

    pub fn image_type(self, format: PixelFormat) -> Result<Self, ThumbnailError> {
        self.set(|p| p.image_type(format))
    }

    pub fn output_format(self, name: &str) -> Result<Self, ThumbnailError> {
        self.set(|p| p.output_format(name))
    }

    pub fn output_quality(self, quality: f32) -> Result<Self, ThumbnailError> {
        self.set(|p| p.output_quality(quality))
    }

    pub fn use_exif_orientation(self, use_exif: bool) -> Result<Self, ThumbnailError> {
        self.set(|p| p.use_exif_orientation(use_exif))
    }

    pub fn source_region(self, region: Region) -> Result<Self, ThumbnailError> {
        self.set(|p| p.source_region(region))
    }

    pub fn crop(self, position: Position) -> Result<Self, ThumbnailError> {
        self.set(|p| p.crop(position))
    }

    pub fn rotate(self, degrees: i32) -> Result<Self, ThumbnailError> {
        self.set(|p| p.rotate(degrees))
    }

    pub fn watermark(mut self, watermark: Watermark) -> Self {
        self.params.watermark(watermark);
        self
    }

    pub fn add_filter(mut self, filter: Arc<dyn ImageFilter>) -> Self {
        self.params.add_filter(filter);
        self
    }

    /// Replace existing destination files (the default) or leave them alone.
    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn backend(mut self, backend: impl ImageBackend + Send + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    /// Receive progress events. Without one, events are only traced.
    pub fn listener(mut self, listener: impl ProgressSink + Send + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    // ------------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------------

    /// The thumbnail of the single source, in memory.
    pub fn as_image(self) -> Result<DynamicImage, ThumbnailError> {
        if self.sources.len() > 1 {
            return Err(ParameterError::MultipleToOneImage.into());
        }
        let mut images = self.as_images()?;
        images.pop().ok_or_else(|| ParameterError::NoSources.into())
    }

    /// One thumbnail per source, in source order.
    pub fn as_images(self) -> Result<Vec<DynamicImage>, ThumbnailError> {
        let (mut runner, sources) = self.freeze()?;
        sources
            .into_iter()
            .map(|source| runner.run(source, BitmapSink))
            .collect()
    }

    /// Write the single source's thumbnail to `path`.
    ///
    /// Returns the path written, which gains the output format's extension
    /// when `path` names another format, or `None` when the file existed and
    /// overwriting is disabled.
    pub fn to_file(self, path: impl Into<PathBuf>) -> Result<Option<PathBuf>, ThumbnailError> {
        if self.sources.len() > 1 {
            return Err(ParameterError::MultipleToOneFile.into());
        }
        let path: PathBuf = path.into();
        let mut written = self.to_files(std::iter::once(path))?;
        Ok(written.pop())
    }

    /// Write each source's thumbnail to the next name from `names`.
    ///
    /// Running out of names fails at that source; thumbnails already
    /// written stay on disk. Skipped destinations are left out of the result.
    pub fn to_files<I>(self, names: I) -> Result<Vec<PathBuf>, ThumbnailError>
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let (mut runner, sources) = self.freeze()?;
        let mut names = names.into_iter();
        let mut written = Vec::with_capacity(sources.len());
        for (index, source) in sources.into_iter().enumerate() {
            let name = names
                .next()
                .ok_or(ThumbnailError::NotEnoughNames { index })?;
            if let Some(path) = runner.run_to_file(source, name.into())? {
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Write the single source's thumbnail to `writer`.
    pub fn to_writer<W: Write>(self, writer: W) -> Result<(), ThumbnailError> {
        if self.sources.len() > 1 {
            return Err(ParameterError::MultipleToOneStream.into());
        }
        self.to_writers(std::iter::once(writer))
    }

    /// Write each source's thumbnail to the next writer.
    pub fn to_writers<W: Write>(
        self,
        writers: impl IntoIterator<Item = W>,
    ) -> Result<(), ThumbnailError> {
        if self.params.explicit_output_format().is_none() {
            return Err(ParameterError::OutputFormatNotSpecified.into());
        }
        let (mut runner, sources) = self.freeze()?;
        let mut writers = writers.into_iter();
        for (index, source) in sources.into_iter().enumerate() {
            let writer = writers
                .next()
                .ok_or(ThumbnailError::NotEnoughStreams { index })?;
            runner.run(source, WriterSink::new(writer, index))?;
        }
        Ok(())
    }

    fn freeze(self) -> Result<(Runner, Vec<S>), ThumbnailError> {
        let params = Arc::new(self.params.build()?);
        Ok((
            Runner {
                params,
                allow_overwrite: self.allow_overwrite,
                backend: self.backend,
                listener: self.listener,
            },
            self.sources,
        ))
    }
}

impl Builder<FileSource> {
    /// Write each thumbnail next to its source, named by `rename`.
    pub fn to_files_renamed(self, rename: Rename) -> Result<Vec<PathBuf>, ThumbnailError> {
        let names: Vec<PathBuf> = self
            .sources
            .iter()
            .filter_map(|s| s.path().map(|p| rename.apply_to_path(p, None)))
            .collect();
        self.to_files(names)
    }

    /// Write each thumbnail into `directory`, named by `rename`.
    pub fn to_directory(
        self,
        directory: impl AsRef<Path>,
        rename: Rename,
    ) -> Result<Vec<PathBuf>, ThumbnailError> {
        let directory = directory.as_ref();
        let names: Vec<PathBuf> = self
            .sources
            .iter()
            .filter_map(|s| s.path().map(|p| rename.apply_to_path(p, Some(directory))))
            .collect();
        self.to_files(names)
    }
}

/// The frozen half of a builder, driving tasks one at a time.
struct Runner {
    params: Arc<ThumbnailParameter>,
    allow_overwrite: bool,
    backend: Box<dyn ImageBackend + Send>,
    listener: Box<dyn ProgressSink + Send>,
}

impl Runner {
    fn run<S: ImageSource, D: ImageSink>(
        &mut self,
        source: S,
        sink: D,
    ) -> Result<D::Output, ThumbnailError> {
        let mut task = ThumbnailTask::new(Arc::clone(&self.params), source, sink);
        Ok(task.run(self.backend.as_ref(), self.listener.as_mut())?)
    }

    fn run_to_file<S: ImageSource>(
        &mut self,
        source: S,
        path: PathBuf,
    ) -> Result<Option<PathBuf>, ThumbnailError> {
        let sink = FileSink::new(path, self.params.output_format);
        if !self.allow_overwrite && sink.path().exists() {
            warn!(destination = %sink.path().display(), "destination exists, skipping");
            self.listener.emit(ProgressEvent::Skipped {
                source: source.name(),
                destination: sink.name(),
            });
            return Ok(None);
        }
        self.run(source, sink).map(Some)
    }
}
