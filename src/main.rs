//! Launch Telemetry CLI
//!
//! Command-line interface for extracting telemetry from launch videos
//! and building recognition training sheets.

use clap::{Parser, Subcommand};
use launch_telemetry::{
    capture::{FrameSource, SourceError},
    config::{ConfigError, FileConfig},
    metrics::{MetricsError, MetricsRegistry, MetricsSnapshot},
    pipeline::{PipelineError, RunEnd, TelemetryPipeline},
    recognition::{OverlayReader, RecognizeError},
    series::SeriesError,
    training::{self, GlyphError},
};
#[cfg(all(feature = "video", feature = "ocr"))]
use launch_telemetry::{capture::VideoFile, recognition::TesseractEngine};
#[cfg(not(all(feature = "video", feature = "ocr")))]
use launch_telemetry::{capture::SyntheticVideo, recognition::ScriptedRecognizer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "launch-telemetry", version, about = "Read velocity and altitude from launch broadcast overlays")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the telemetry series from a video
    Extract {
        /// Input video
        video: PathBuf,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file, one `time,velocity,altitude` row per frame
        #[arg(short, long, default_value = "telemetry.csv")]
        output: PathBuf,
        /// Write run metrics in Prometheus text format
        #[arg(long)]
        metrics_out: Option<PathBuf>,
        /// Skip this many seconds before searching for liftoff
        #[arg(long)]
        start_at: Option<f64>,
    },
    /// Collect velocity digit glyphs into a training sheet
    Glyphs {
        /// Input video
        video: PathBuf,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output image
        #[arg(short, long, default_value = "training.png")]
        output: PathBuf,
    },
    /// Print the default configuration as TOML
    PrintConfig,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Glyph(#[from] GlyphError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[cfg(not(all(feature = "video", feature = "ocr")))]
    #[error("built without video decoding and text recognition (enable the `video` and `ocr` features)")]
    BackendUnavailable,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Extract {
            video,
            config,
            output,
            metrics_out,
            start_at,
        } => extract(&video, config.as_deref(), &output, metrics_out.as_deref(), start_at),
        Command::Glyphs {
            video,
            config,
            output,
        } => glyphs(&video, config.as_deref(), &output),
        Command::PrintConfig => print_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    match path {
        Some(path) => FileConfig::from_file(path),
        None => {
            let config = FileConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn extract(
    video: &Path,
    config: Option<&Path>,
    output: &Path,
    metrics_out: Option<&Path>,
    start_at: Option<f64>,
) -> Result<(), CliError> {
    let mut config = load_config(config)?;
    if start_at.is_some() {
        config.capture.start_at_seconds = start_at;
        config.capture.validate()?;
    }

    info!("Launch Telemetry v{}", launch_telemetry::VERSION);
    let pipeline = TelemetryPipeline::new(config.pipeline_config())?;
    let (mut source, mut reader) = open_backends(video, &config)?;

    let run = pipeline.run(&mut source, &mut reader)?;
    if let RunEnd::LockLost { since } = run.end {
        warn!(since, "Lock lost; series ends early");
    }

    run.series.save(output, config.output.time_column)?;
    info!(digest = %run.series.digest(), samples = run.series.len(), "Series digest");

    if let Some(path) = metrics_out {
        let registry = MetricsRegistry::new()?;
        registry.update(&MetricsSnapshot::from_run(&run));
        std::fs::write(path, registry.encode()?).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}

fn glyphs(video: &Path, config: Option<&Path>, output: &Path) -> Result<(), CliError> {
    let config = load_config(config)?;
    let (mut source, mut reader) = open_backends(video, &config)?;

    let info = source.info();
    if !config.capture.accepts(&info) {
        return Err(PipelineError::ResolutionMismatch {
            expected_width: config.capture.width,
            expected_height: config.capture.height,
            width: info.width,
            height: info.height,
        }
        .into());
    }
    if let Some(seconds) = config.capture.start_at_seconds {
        source.seek_time(seconds)?;
    }

    let collector = training::collect_glyphs(&mut source, &mut reader, &config.sync, &config.glyphs)?;
    collector.save_sheet(output)?;
    Ok(())
}

fn print_config() -> Result<(), CliError> {
    print!("{}", FileConfig::default().to_toml()?);
    Ok(())
}

#[cfg(all(feature = "video", feature = "ocr"))]
fn open_backends(
    video: &Path,
    config: &FileConfig,
) -> Result<(VideoFile, OverlayReader<TesseractEngine>), CliError> {
    let source = VideoFile::open(video)?;
    let engine = TesseractEngine::new(&config.recognition)?;
    let reader = OverlayReader::new(engine, config.overlay.clone(), &config.recognition);
    Ok((source, reader))
}

#[cfg(not(all(feature = "video", feature = "ocr")))]
fn open_backends(
    _video: &Path,
    _config: &FileConfig,
) -> Result<(SyntheticVideo, OverlayReader<ScriptedRecognizer>), CliError> {
    Err(CliError::BackendUnavailable)
}
