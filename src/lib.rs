//! # Simple Thumbs
//!
//! A thumbnail pipeline: read an image from a bitmap, file, stream or URL,
//! shrink it with progressive downscaling, run a chain of filters over the
//! result and write it out as a bitmap, file or stream.
//!
//! ```no_run
//! # fn main() -> Result<(), simple_thumbs::ThumbnailError> {
//! use simple_thumbs::Thumbnails;
//! use simple_thumbs::naming::Rename;
//!
//! Thumbnails::of_files(["a.jpg", "b.png"])?
//!     .size(200, 200)?
//!     .to_files_renamed(Rename::PrefixDotThumbnail)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture: Four-Phase Tasks
//!
//! Every source becomes one [`task::ThumbnailTask`], which runs the same four
//! phases in order and reports each through a [`task::ProgressSink`]:
//!
//! ```text
//! 1. Acquire   source  →  decoded bitmap + EXIF orientation
//! 2. Resize    bitmap  →  source region, orientation, resize, crop, pixel format
//! 3. Filter    bitmap  →  watermarks, captions, canvas, rotation, ...
//! 4. Output    bitmap  →  sink (memory, file or stream)
//! ```
//!
//! Settings are validated once, as they are given, and frozen into an
//! immutable [`parameter::ThumbnailParameter`] shared by every task in a batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`builder`] | [`Thumbnails`] entry points, the chained [`Builder`] and its terminals |
//! | [`parameter`] | Fail-fast option validation and the frozen parameter set |
//! | [`task`] | The four-phase task, its state machine and progress events |
//! | [`source`] | Image sources: bitmaps, files, readers, URLs |
//! | [`sink`] | Image sinks: bitmaps, files, writers |
//! | [`imaging`] | Codec backend seam, dimension math, progressive resizing |
//! | [`geometry`] | Positions, sizes and regions inside an enclosing rectangle |
//! | [`filters`] | Post-resize image filters and the filter pipeline |
//! | [`naming`] | Destination names derived from source names |
//! | [`config`] | `thumbs.toml` loading, layering and validation for the CLI |
//! | [`output`] | CLI event formatting and the run report |
//!
//! # Design Decisions
//!
//! ## Progressive Downscaling
//!
//! A single bilinear pass aliases once it shrinks by more than 2×. The default
//! resizer halves the image repeatedly and makes one final pass onto the
//! target, see [`imaging::progressive_steps`].
//!
//! ## Pure-Rust Codecs
//!
//! Decoding and encoding go through [`imaging::ImageBackend`]. The production
//! [`imaging::RustBackend`] uses the `image` crate only, so the binary has no
//! system dependencies. Tests swap in a mock backend.

pub mod builder;
pub mod config;
pub mod filters;
pub mod geometry;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod parameter;
pub mod sink;
pub mod source;
pub mod task;

pub use builder::{Builder, ThumbnailError, Thumbnails};
pub use parameter::{ParameterError, ThumbnailParameter};
pub use task::{ProgressEvent, ProgressSink, TaskError};
