use clap::{Parser, Subcommand};
use image::ImageFormat;
use rayon::prelude::*;
use simple_thumbs::config::{self, ConfigError, ThumbsConfig};
use simple_thumbs::filters::Watermark;
use simple_thumbs::naming::Rename;
use simple_thumbs::output::{self, Report};
use simple_thumbs::task::ProgressEvent;
use simple_thumbs::{ThumbnailError, Thumbnails};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "simple-thumbs")]
#[command(about = "Generate thumbnails for image files")]
#[command(long_about = "\
Generate thumbnails for image files

Inputs can be files or directories; directories are walked recursively and
every readable image inside is processed. Each source gets one thumbnail,
named by the rename strategy and written next to the source or into
--out-dir.

Settings are layered: stock defaults, then thumbs.toml, then flags.

Run 'simple-thumbs gen-config' to generate a documented thumbs.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Show start and phase progress for every image
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate thumbnails for files and directories
    Generate(GenerateArgs),
    /// Print a stock thumbs.toml with all options documented
    GenConfig,
}

/// Flags that override `thumbs.toml`.
#[derive(clap::Args, Default)]
struct GenerateArgs {
    /// Image files or directories to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Bounding box width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Bounding box height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Scale factor instead of a bounding box
    #[arg(long, conflicts_with_all = ["width", "height"])]
    scale: Option<f64>,

    /// Stretch to exactly width x height
    #[arg(long)]
    ignore_aspect_ratio: bool,

    /// Fill the box and crop at this position (e.g. center, top-left)
    #[arg(long)]
    crop: Option<String>,

    /// Output format (jpg, png, webp, ...)
    #[arg(long)]
    format: Option<String>,

    /// Lossy output quality, 0.0 - 1.0
    #[arg(long)]
    quality: Option<f32>,

    /// Naming strategy (e.g. prefix-dot-thumbnail, suffix:-small)
    #[arg(long)]
    rename: Option<String>,

    /// Write thumbnails into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Leave existing thumbnails untouched
    #[arg(long)]
    no_overwrite: bool,

    /// Maximum parallel workers
    #[arg(long)]
    max_processes: Option<usize>,

    /// Write a JSON report of written, skipped and failed files
    #[arg(long)]
    report: Option<PathBuf>,
}

impl GenerateArgs {
    /// The flags as a TOML overlay for [`config::merge_toml`].
    fn overlay(&self) -> toml::Value {
        let mut thumbnails = toml::Table::new();
        if let Some(w) = self.width {
            thumbnails.insert("width".into(), toml::Value::Integer(i64::from(w)));
        }
        if let Some(h) = self.height {
            thumbnails.insert("height".into(), toml::Value::Integer(i64::from(h)));
        }
        if let Some(s) = self.scale {
            thumbnails.insert("scale".into(), toml::Value::Float(s));
        }
        if self.ignore_aspect_ratio {
            thumbnails.insert("keep_aspect_ratio".into(), toml::Value::Boolean(false));
        }
        if let Some(c) = &self.crop {
            thumbnails.insert("crop".into(), toml::Value::String(c.clone()));
        }

        let mut output = toml::Table::new();
        if let Some(f) = &self.format {
            output.insert("format".into(), toml::Value::String(f.clone()));
        }
        if let Some(q) = self.quality {
            output.insert("quality".into(), toml::Value::Float(f64::from(q)));
        }
        if let Some(r) = &self.rename {
            output.insert("rename".into(), toml::Value::String(r.clone()));
        }
        if let Some(d) = &self.out_dir {
            output.insert(
                "directory".into(),
                toml::Value::String(d.display().to_string()),
            );
        }
        if self.no_overwrite {
            output.insert("overwrite".into(), toml::Value::Boolean(false));
        }

        let mut processing = toml::Table::new();
        if let Some(n) = self.max_processes {
            processing.insert("max_processes".into(), toml::Value::Integer(n as i64));
        }

        let mut root = toml::Table::new();
        root.insert("thumbnails".into(), toml::Value::Table(thumbnails));
        root.insert("output".into(), toml::Value::Table(output));
        root.insert("processing".into(), toml::Value::Table(processing));
        toml::Value::Table(root)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => {
            let config = layered_config(&cli.config, &args)?;
            init_thread_pool(&config.processing);

            let sources = collect_sources(&args.inputs);
            if sources.is_empty() {
                return Err("no images found in the given inputs".into());
            }
            debug!(count = sources.len(), "collected sources");

            let report = generate(&config, sources, cli.verbose)?;
            if let Some(path) = &args.report {
                std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
            }
            println!("{}", output::format_summary(&report));
            if !report.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stock defaults, then the config file, then the command-line flags.
fn layered_config(path: &Path, args: &GenerateArgs) -> Result<ThumbsConfig, ConfigError> {
    let mut base = config::stock_defaults_value()?;
    if let Some(file) = config::load_raw_config(path)? {
        base = config::merge_toml(base, file);
    }
    let mut merged = config::merge_toml(base, args.overlay());

    // Size flags replace the other sizing mode instead of conflicting with it.
    if let Some(toml::Value::Table(thumbnails)) = merged.get_mut("thumbnails") {
        if args.scale.is_some() {
            thumbnails.remove("width");
            thumbnails.remove("height");
        } else if args.width.is_some() || args.height.is_some() {
            thumbnails.remove("scale");
        }
    }
    config::resolve_config(merged, None)
}

/// Run one builder per source on the rayon pool, printing events as they
/// arrive from a dedicated thread.
fn generate(
    config: &ThumbsConfig,
    sources: Vec<PathBuf>,
    verbose: bool,
) -> Result<Report, Box<dyn std::error::Error>> {
    let rename = config.output.rename_strategy()?;
    let watermark = config.watermark.as_ref().map(|wm| wm.load()).transpose()?;

    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        let mut report = Report::default();
        for event in rx {
            output::print_event(&event, verbose);
            report.record(&event);
        }
        report
    });

    let errors: Vec<(PathBuf, ThumbnailError)> = sources
        .into_par_iter()
        .filter_map(|source| {
            thumbnail_one(config, &source, watermark.as_ref(), &rename, tx.clone())
                .err()
                .map(|e| (source, e))
        })
        .collect();
    drop(tx);

    let mut report = printer.join().map_err(|_| "printer thread panicked")?;
    for (source, error) in errors {
        // Task failures were already reported through the event stream.
        if !matches!(error, ThumbnailError::Task(_)) {
            warn!(source = %source.display(), "{error}");
            report.record_error(&source.display().to_string(), error.to_string());
        }
    }
    Ok(report)
}

fn thumbnail_one(
    config: &ThumbsConfig,
    source: &Path,
    watermark: Option<&Watermark>,
    rename: &Rename,
    events: mpsc::Sender<ProgressEvent>,
) -> Result<Vec<PathBuf>, ThumbnailError> {
    let mut builder = config
        .configure(Thumbnails::of_files([source])?)?
        .listener(events);
    if let Some(wm) = watermark {
        builder = builder.watermark(wm.clone());
    }
    match &config.output.directory {
        Some(dir) => builder.to_directory(dir, rename.clone()),
        None => builder.to_files_renamed(rename.clone()),
    }
}

/// Expand directories into the readable image files they contain.
fn collect_sources(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_image(p))
                .collect();
            found.sort();
            sources.extend(found);
        } else {
            sources.push(input.clone());
        }
    }
    sources
}

fn is_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|f| f.reading_enabled())
}

/// Size the global rayon pool from `[processing]`; never above the core count.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
