use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use qtrace_lib::{
    analysis::{AnalysisError, ChannelAnalyzer},
    edf,
    lod::select_sampling,
    signal::TimeWindow,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "qtrace",
    version,
    about = "qtrace: EDF waveform decoding and QT interval analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode only the 256-byte recording header
    Header {
        #[arg(long)]
        input: PathBuf,
    },
    /// Decode the per-channel calibration catalog
    Channels {
        #[arg(long)]
        input: PathBuf,
    },
    /// Decode the whole recording; the record walk runs on the background worker
    Decode {
        #[arg(long)]
        input: PathBuf,
        /// Restrict the sample output to one channel index
        #[arg(long)]
        channel: Option<usize>,
    },
    /// Locate R/S landmarks and QTc statistics over one or more windows
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 0)]
        channel: usize,
        /// Window as start:end in milliseconds; repeatable
        #[arg(long = "window", required = true)]
        windows: Vec<String>,
        /// Span each interval across the Q..T approximation instead of the window bounds
        #[arg(long)]
        qt_approx: bool,
    },
    /// Print the downsampling policy for a visible span percentage
    Sampling {
        #[arg(long)]
        span: f64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Header { input } => cmd_header(&input)?,
        Commands::Channels { input } => cmd_channels(&input)?,
        Commands::Decode { input, channel } => cmd_decode(&input, channel)?,
        Commands::Analyze {
            input,
            channel,
            windows,
            qt_approx,
        } => cmd_analyze(&input, channel, &windows, qt_approx)?,
        Commands::Sampling { span } => cmd_sampling(span)?,
    }
    Ok(())
}

fn read_buffer(input: &Path) -> Result<Vec<u8>> {
    std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))
}

fn cmd_header(input: &Path) -> Result<()> {
    let buffer = read_buffer(input)?;
    let header = edf::decode_header(&buffer)?;
    println!("{}", serde_json::to_string(&header)?);
    Ok(())
}

fn cmd_channels(input: &Path) -> Result<()> {
    let buffer = read_buffer(input)?;
    let header = edf::decode_header(&buffer)?;
    let channels = edf::decode_channels(&buffer, header.channel_count)?;
    println!("{}", serde_json::to_string(&channels)?);
    Ok(())
}

fn cmd_decode(input: &Path, channel: Option<usize>) -> Result<()> {
    let mut recording = edf::decode_file(input)?;
    if let Some(index) = channel {
        if index >= recording.samples.len() {
            bail!(
                "recording has {} channels; channel {} is out of range",
                recording.samples.len(),
                index
            );
        }
        recording.samples = vec![recording.samples.swap_remove(index)];
    }
    println!("{}", serde_json::to_string(&recording)?);
    Ok(())
}

#[derive(Serialize)]
struct AnalyzeOutput {
    channel: usize,
    label: String,
    intervals: Vec<qtrace_lib::AnalyzedInterval>,
    heart_rate: f64,
}

fn parse_window(text: &str) -> Result<TimeWindow> {
    let (start, end) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("window '{text}' is not start:end"))?;
    let start: f64 = start
        .trim()
        .parse()
        .with_context(|| format!("window start '{start}' is not a number"))?;
    let end: f64 = end
        .trim()
        .parse()
        .with_context(|| format!("window end '{end}' is not a number"))?;
    Ok(TimeWindow::new(start, end))
}

fn cmd_analyze(input: &Path, channel: usize, windows: &[String], qt_approx: bool) -> Result<()> {
    let recording = edf::decode_file(input)?;
    let samples = recording.samples.get(channel).ok_or_else(|| {
        anyhow!(
            "recording has {} channels; channel {} is out of range",
            recording.samples.len(),
            channel
        )
    })?;

    let mut analyzer = ChannelAnalyzer::new();
    for text in windows {
        let window = parse_window(text)?;
        let outcome = if qt_approx {
            analyzer.mark_qt_interval(&samples.points, window)
        } else {
            analyzer.analyze_window(&samples.points, window)
        };
        match outcome {
            Ok(_) => {}
            // an empty window is recovered: skip it, keep the rest
            Err(AnalysisError::EmptyWindow { start_ms, end_ms }) => {
                warn!("window [{start_ms}, {end_ms}] contains no samples, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let report = analyzer.report();
    let output = AnalyzeOutput {
        channel,
        label: samples.label.clone(),
        intervals: report.intervals,
        heart_rate: report.heart_rate,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn cmd_sampling(span: f64) -> Result<()> {
    println!("{}", serde_json::to_string(&select_sampling(span))?);
    Ok(())
}
