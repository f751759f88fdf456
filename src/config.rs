//! Configuration for the command-line tool.
//!
//! Handles loading, validating, and merging `thumbs.toml`. Settings are
//! layered: stock defaults, then the config file, then command-line flags.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnails]
//! # width = 160                     # Bounding box; set width and/or height,
//! # height = 160                    # or `scale`. None of them: 160 x 160
//! # scale = 0.25
//! keep_aspect_ratio = true
//! # crop = "center"                 # Fill the box, then crop at this position
//! # scaling = "progressive-bilinear" # bilinear | bicubic | progressive-bilinear
//! use_exif_orientation = true
//!
//! [output]
//! # format = "jpg"                  # Omit to keep each source's format
//! # quality = 0.8                   # 0.0 - 1.0, lossy formats only
//! rename = "prefix-dot-thumbnail"   # or "prefix:STR" / "suffix:STR"
//! # directory = "thumbs"            # Omit to write next to each source
//! overwrite = true
//!
//! # [watermark]
//! # image = "logo.png"
//! # position = "bottom-right"
//! # opacity = 0.5
//! # inset = 8
//!
//! [processing]
//! # max_processes = 4               # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::builder::{Builder, ThumbnailError};
use crate::filters::{FilterError, Watermark};
use crate::geometry::{Insets, Position};
use crate::imaging::{ImageBackend, RustBackend, ScalingMode, format_from_name};
use crate::naming::Rename;
use crate::source::ImageSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "thumbs.toml";

/// Bounding box used when neither a size nor a scale is configured.
pub const DEFAULT_BOX: u32 = 160;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Watermark error: {0}")]
    Watermark(String),
}

impl From<FilterError> for ConfigError {
    fn from(e: FilterError) -> Self {
        ConfigError::Watermark(e.to_string())
    }
}

/// Tool configuration loaded from `thumbs.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbsConfig {
    pub thumbnails: ThumbnailsConfig,
    pub output: OutputConfig,
    pub watermark: Option<WatermarkConfig>,
    pub processing: ProcessingConfig,
}

/// How each thumbnail is sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f64>,
    pub keep_aspect_ratio: bool,
    pub crop: Option<Position>,
    pub scaling: Option<ScalingMode>,
    pub use_exif_orientation: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            scale: None,
            keep_aspect_ratio: true,
            crop: None,
            scaling: None,
            use_exif_orientation: true,
        }
    }
}

/// Where and how thumbnails are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: Option<String>,
    pub quality: Option<f32>,
    pub rename: String,
    pub directory: Option<PathBuf>,
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            quality: None,
            rename: "prefix-dot-thumbnail".to_string(),
            directory: None,
            overwrite: true,
        }
    }
}

impl OutputConfig {
    pub fn rename_strategy(&self) -> Result<Rename, ConfigError> {
        Rename::from_name(&self.rename).ok_or_else(|| {
            ConfigError::Validation(format!("output.rename: unknown strategy '{}'", self.rename))
        })
    }
}

/// An image stamped onto every thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkConfig {
    pub image: PathBuf,
    #[serde(default = "default_watermark_position")]
    pub position: Position,
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub inset: u32,
}

fn default_watermark_position() -> Position {
    Position::BottomRight
}

fn default_watermark_opacity() -> f32 {
    0.5
}

impl WatermarkConfig {
    /// Decode the watermark image and build the filter.
    pub fn load(&self) -> Result<Watermark, ConfigError> {
        let data = fs::read(&self.image)?;
        let decoded = RustBackend::new()
            .decode(&data)
            .map_err(|e| ConfigError::Watermark(format!("{}: {e}", self.image.display())))?;
        Ok(Watermark::new(self.position, &decoded.image, self.opacity)?
            .with_insets(Insets::uniform(self.inset)))
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

impl ThumbsConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thumbnails;
        let sized = t.width.is_some() || t.height.is_some();
        match (sized, t.scale) {
            (true, Some(_)) => {
                return Err(ConfigError::Validation(
                    "thumbnails: set either width/height or scale, not both".into(),
                ));
            }
            (false, Some(scale)) if !(scale.is_finite() && scale > 0.0) => {
                return Err(ConfigError::Validation(
                    "thumbnails.scale must be greater than zero".into(),
                ));
            }
            _ => {}
        }
        if t.width == Some(0) || t.height == Some(0) {
            return Err(ConfigError::Validation(
                "thumbnails.width and thumbnails.height must be non-zero".into(),
            ));
        }
        if let Some(q) = self.output.quality
            && !(0.0..=1.0).contains(&q)
        {
            return Err(ConfigError::Validation(
                "output.quality must be 0.0-1.0".into(),
            ));
        }
        if let Some(format) = &self.output.format
            && format_from_name(format).is_none()
        {
            return Err(ConfigError::Validation(format!(
                "output.format: unsupported format '{format}'"
            )));
        }
        self.output.rename_strategy()?;
        if let Some(wm) = &self.watermark
            && !(0.0..=1.0).contains(&wm.opacity)
        {
            return Err(ConfigError::Validation(
                "watermark.opacity must be 0.0-1.0".into(),
            ));
        }
        Ok(())
    }

    /// Apply the thumbnail and output settings to a builder.
    pub fn configure<S: ImageSource>(
        &self,
        mut builder: Builder<S>,
    ) -> Result<Builder<S>, ThumbnailError> {
        let t = &self.thumbnails;
        builder = match (t.width, t.height, t.scale) {
            (Some(w), Some(h), _) => builder.size(w, h)?,
            (Some(w), None, _) => builder.width(w)?,
            (None, Some(h), _) => builder.height(h)?,
            (None, None, Some(scale)) => builder.scale(scale)?,
            (None, None, None) => builder.size(DEFAULT_BOX, DEFAULT_BOX)?,
        };
        if !t.keep_aspect_ratio {
            builder = builder.keep_aspect_ratio(false)?;
        }
        if let Some(position) = t.crop {
            builder = builder.crop(position)?;
        }
        if let Some(mode) = t.scaling {
            builder = builder.scaling_mode(mode)?;
        }
        if !t.use_exif_orientation {
            builder = builder.use_exif_orientation(false)?;
        }
        if let Some(format) = &self.output.format {
            builder = builder.output_format(format)?;
        }
        if let Some(quality) = self.output.quality {
            builder = builder.output_quality(quality)?;
        }
        Ok(builder.allow_overwrite(self.output.overwrite))
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ThumbsConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ThumbsConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ThumbsConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged on top of stock defaults.
pub fn load_config(path: &Path) -> Result<ThumbsConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(path)?)
}

/// A fully commented stock `thumbs.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-thumbs configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Thumbnail size
# ---------------------------------------------------------------------------
[thumbnails]
# Bounding box in pixels. Set width and/or height, or `scale` instead.
# With none of the three, thumbnails fit a 160 x 160 box.
# width = 160
# height = 160

# Scale factor applied to both axes (replaces width/height).
# scale = 0.25

# Keep the source aspect ratio inside the bounding box.
# Setting this to false stretches to exactly width x height.
keep_aspect_ratio = true

# Fill the box and crop the overflow at this position:
# top-left, top-center, top-right, center-left, center, center-right,
# bottom-left, bottom-center, bottom-right.
# crop = "center"

# Resampling: bilinear, bicubic or progressive-bilinear.
# Omit to choose per image from the scaling ratio.
# scaling = "progressive-bilinear"

# Honour the EXIF orientation tag of JPEG/TIFF sources.
use_exif_orientation = true

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Encode as this format (jpg, png, webp, gif, bmp, tiff, avif).
# Omit to use the destination extension, falling back to the source format.
# format = "jpg"

# Lossy encoding quality, 0.0 (worst) to 1.0 (best).
# quality = 0.8

# File naming: no-change, prefix-dot-thumbnail, prefix-hyphen-thumbnail,
# suffix-dot-thumbnail, suffix-hyphen-thumbnail, prefix:STR, suffix:STR.
rename = "prefix-dot-thumbnail"

# Write into this directory instead of next to each source.
# directory = "thumbs"

# Replace thumbnails that already exist.
overwrite = true

# ---------------------------------------------------------------------------
# Watermark
# ---------------------------------------------------------------------------
# [watermark]
# image = "logo.png"
# position = "bottom-right"
# opacity = 0.5
# inset = 8

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
