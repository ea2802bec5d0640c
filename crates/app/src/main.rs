mod decode;
mod sink;
mod term;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spectrum_visualiser_core::{FrameScheduler, SampleStore, SpectralConfig, TimingConfig};

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let sample_rate = sink::default_output_rate().context("cannot open audio output")?;
    tracing::info!(path = %cli.input.display(), sample_rate, "decoding");
    let buffer = decode::decode_file(&cli.input, sample_rate)?;

    let config = SpectralConfig::default();
    let timing = TimingConfig::default();

    // Room for a few look-ahead chunks so a slow tick cannot starve the
    // device before the next submission lands.
    let capacity = timing.frame_offset * timing.chunks_per_submit * 4;
    let sink = sink::CpalSink::open(sample_rate, capacity).context("cannot open audio output")?;

    let _ui = term::TerminalUi::setup().context("cannot initialise the terminal")?;

    let mut scheduler = FrameScheduler::new(
        SampleStore::new(buffer),
        config,
        timing,
        term::TerminalRenderer::new(),
        sink,
        term::TerminalInput,
    );
    let reason = scheduler.run()?;

    drop(_ui);
    tracing::info!(?reason, "stopped");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Live audio spectrum visualiser", long_about = None)]
struct Cli {
    /// Path to the audio file to play and visualise.
    input: PathBuf,
}
