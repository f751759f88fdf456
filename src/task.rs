//! One source, one destination: acquire → resize → filter → output.
//!
//! ```text
//! Created → Acquiring → Resizing → Filtering → Outputting → Done
//!               └───────────┴──────────┴───────────┴──────→ Failed
//! ```
//!
//! Every phase reports `0.0` before it starts and `1.0` when it is done, even
//! when there is nothing to do (an empty filter chain still reports both).
//! The first error moves the task to `Failed`, is reported to the listener
//! with the source's identity and is returned; nothing is retried.

use crate::geometry::{GeometryError, Region, Size};
use crate::imaging::orientation::region_flags;
use crate::imaging::{BackendError, ImageBackend, ResizeError};
use crate::parameter::{Dimensioning, ThumbnailParameter};
use crate::filters::ImageFilter;
use crate::sink::{Encoding, ImageSink, SinkError};
use crate::source::ImageSource;
use image::metadata::Orientation;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Acquire,
    Resize,
    Filter,
    Output,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Acquire => "acquire",
            Phase::Resize => "resize",
            Phase::Filter => "filter",
            Phase::Output => "output",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Acquiring,
    Resizing,
    Filtering,
    Outputting,
    Done,
    Failed,
}

impl TaskState {
    fn of(phase: Phase) -> Self {
        match phase {
            Phase::Acquire => TaskState::Acquiring,
            Phase::Resize => TaskState::Resizing,
            Phase::Filter => TaskState::Filtering,
            Phase::Output => TaskState::Outputting,
        }
    }
}

/// What went wrong inside a phase.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("The source region lies outside the image.")]
    EmptyRegion,
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{source_name}: {phase} failed: {error}")]
    Phase {
        source_name: String,
        phase: Phase,
        #[source]
        error: PhaseError,
    },
    #[error("The task for {0} has already run.")]
    AlreadyRun(String),
}

impl TaskError {
    /// Name of the source the failing task was processing.
    pub fn source_name(&self) -> &str {
        match self {
            TaskError::Phase { source_name, .. } | TaskError::AlreadyRun(source_name) => {
                source_name
            }
        }
    }
}

/// Notifications sent while thumbnails are produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        source: String,
    },
    Phase {
        source: String,
        phase: Phase,
        progress: f32,
    },
    Finished {
        source: String,
        destination: String,
    },
    Failed {
        source: String,
        phase: Phase,
        message: String,
    },
    /// The destination existed and overwriting was disabled.
    Skipped {
        source: String,
        destination: String,
    },
}

/// Receives progress events in order.
///
/// Events are delivered synchronously; a slow sink slows the task.
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);
}

impl ProgressSink for Sender<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(event);
    }
}

impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// Logs events at debug level; used when no listener is registered.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&mut self, event: ProgressEvent) {
        debug!(?event, "progress");
    }
}

/// Processes one source into one destination.
pub struct ThumbnailTask<S, D> {
    params: Arc<ThumbnailParameter>,
    source: S,
    sink: D,
    state: TaskState,
}

impl<S: ImageSource, D: ImageSink> ThumbnailTask<S, D> {
    pub fn new(params: Arc<ThumbnailParameter>, source: S, sink: D) -> Self {
        Self {
            params,
            source,
            sink,
            state: TaskState::Created,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run every phase. A task runs once; later calls fail.
    pub fn run(
        &mut self,
        backend: &dyn ImageBackend,
        listener: &mut dyn ProgressSink,
    ) -> Result<D::Output, TaskError> {
        let source_name = self.source.name();
        if self.state != TaskState::Created {
            return Err(TaskError::AlreadyRun(source_name));
        }
        listener.emit(ProgressEvent::Started {
            source: source_name.clone(),
        });

        match self.run_phases(&source_name, backend, listener) {
            Ok(output) => {
                self.state = TaskState::Done;
                let destination = self.sink.name();
                info!(source = %source_name, %destination, "thumbnail written");
                listener.emit(ProgressEvent::Finished {
                    source: source_name,
                    destination,
                });
                Ok(output)
            }
            Err((phase, error)) => {
                self.state = TaskState::Failed;
                warn!(source = %source_name, %phase, "thumbnail failed: {error}");
                listener.emit(ProgressEvent::Failed {
                    source: source_name.clone(),
                    phase,
                    message: error.to_string(),
                });
                Err(TaskError::Phase {
                    source_name,
                    phase,
                    error,
                })
            }
        }
    }

    fn run_phases(
        &mut self,
        source_name: &str,
        backend: &dyn ImageBackend,
        listener: &mut dyn ProgressSink,
    ) -> Result<D::Output, (Phase, PhaseError)> {
        let mut report = |phase: Phase, progress: f32| {
            listener.emit(ProgressEvent::Phase {
                source: source_name.to_string(),
                phase,
                progress,
            })
        };

        self.enter(Phase::Acquire);
        report(Phase::Acquire, 0.0);
        let decoded = self
            .source
            .acquire(backend, &mut |p| report(Phase::Acquire, p))
            .map_err(|e| (Phase::Acquire, e.into()))?;
        report(Phase::Acquire, 1.0);
        let source_format = decoded.format;

        self.enter(Phase::Resize);
        report(Phase::Resize, 0.0);
        let orientation = if self.params.use_exif_orientation {
            decoded.orientation
        } else {
            Orientation::NoTransforms
        };
        let resized =
            resize(&self.params, decoded.image, orientation).map_err(|e| (Phase::Resize, e))?;
        report(Phase::Resize, 1.0);

        self.enter(Phase::Filter);
        report(Phase::Filter, 0.0);
        let filtered = if self.params.filters.is_empty() {
            resized
        } else {
            self.params.filters.apply(&resized)
        };
        report(Phase::Filter, 1.0);

        self.enter(Phase::Output);
        report(Phase::Output, 0.0);
        let encoding = Encoding {
            format: resolve_format(
                self.params.output_format,
                self.sink.preferred_format(),
                source_format,
            ),
            quality: self.params.output_quality,
        };
        let output = self
            .sink
            .write(filtered, encoding, backend, &mut |p| report(Phase::Output, p))
            .map_err(|e| (Phase::Output, e.into()))?;
        report(Phase::Output, 1.0);
        Ok(output)
    }

    fn enter(&mut self, phase: Phase) {
        debug!(source = %self.source.name(), %phase, "entering phase");
        self.state = TaskState::of(phase);
    }
}

/// Explicit format, else the destination's, else the source's.
pub fn resolve_format(
    explicit: Option<ImageFormat>,
    destination: Option<ImageFormat>,
    source: Option<ImageFormat>,
) -> Option<ImageFormat> {
    explicit
        .or(destination)
        .or_else(|| source.filter(|f| f.writing_enabled()))
}

/// The resize phase: region, orientation, scaling, crop and pixel layout.
fn resize(
    params: &ThumbnailParameter,
    mut image: DynamicImage,
    orientation: Orientation,
) -> Result<DynamicImage, PhaseError> {
    if let Some(region) = params.source_region {
        let (flip_h, flip_v, swap) = region_flags(orientation);
        let rect = region.calculate(image.width(), image.height(), flip_h, flip_v, swap)?;
        if rect.is_empty() {
            return Err(PhaseError::EmptyRegion);
        }
        image = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    }
    image.apply_orientation(orientation);

    let source = (image.width(), image.height());
    let target = params.resize_dimensions(source);
    let resizer = params.resizer_for(source, target);
    debug!(?source, ?target, ?resizer, "resizing");
    let mut image = resizer.resize(&image, target.0, target.1)?;

    let exact = match params.dimensioning {
        Dimensioning::Size {
            width: Some(w),
            height: Some(h),
        } => Some((w, h)),
        _ => None,
    };
    if let (Some(position), Some((w, h))) = (params.crop, exact) {
        let rect = Region::new(position, Size::absolute(w, h)?).calculate(
            image.width(),
            image.height(),
            false,
            false,
            false,
        )?;
        image = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    }

    Ok(match params.pixel_format {
        Some(format) => format.convert(image),
        None => image,
    })
}
