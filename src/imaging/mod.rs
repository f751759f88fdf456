//! Image processing: codecs, dimension math and resampling.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` + `ImageDecoder::orientation` |
//! | **Encode** | `image` encoders (JPEG/AVIF with quality) |
//! | **Resize** | `DynamicImage::resize_exact`, single pass or progressive |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality, pixel layout and codec names
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Resize**: [`Resizer`] strategies built on [`resize_pixels`]

pub mod backend;
mod calculations;
pub mod orientation;
mod params;
pub mod resize;
pub mod rust_backend;

pub use backend::{BackendError, Decoded, ImageBackend};
pub use calculations::{
    calculate_fill_dimensions, calculate_fit_dimensions, calculate_height_bound,
    calculate_scaled_dimensions, calculate_width_bound, progressive_steps,
};
pub use params::{PixelFormat, Quality, format_from_name, format_name};
pub use resize::{Interpolation, ResizeError, Resizer, ScalingMode, resize_pixels};
pub use rust_backend::RustBackend;
