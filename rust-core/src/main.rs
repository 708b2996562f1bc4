mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cli::{Cli, Command};
use voice_stress::audio::input::list_input_devices;
use voice_stress::spectrum::readout::PLACEHOLDER_LABEL;
use voice_stress::{load_config, Config, StressAnalyzer, StressMonitor, WavClip};

const LOCAL_CONFIG: &str = "voice-stress.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from(LOCAL_CONFIG);
        local.exists().then_some(local)
    });
    let config = match config_path {
        Some(path) => {
            let cfg = load_config(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    match cli.command {
        Command::File {
            path,
            all_blocks,
            sample_rate,
        } => run_file(&config, &path, all_blocks, sample_rate),
        Command::Listen { blocks, device } => run_listen(config, blocks, device),
        Command::Devices => run_devices(),
    }
}

fn run_file(config: &Config, path: &Path, all_blocks: bool, sample_rate: Option<u32>) -> Result<()> {
    let sample_rate = sample_rate.unwrap_or(config.analysis.sample_rate);
    let analyzer = StressAnalyzer::new(config.analysis.with_sample_rate(sample_rate))
        .context("Invalid analysis settings")?;
    let block_len = analyzer.config().block_len;

    let clip = WavClip::open(path, sample_rate)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    if !all_blocks {
        let block = clip.first_block(block_len)?;
        let reading = analyzer.analyze(block)?;
        println!("{}", reading);
        return Ok(());
    }

    let mut count = 0usize;
    for (index, block) in clip.blocks(block_len).enumerate() {
        let reading = analyzer
            .analyze(block)
            .with_context(|| format!("Block {} could not be analyzed", index))?;
        let secs = (index * block_len) as f64 / sample_rate as f64;
        println!("{:>8.3} s  {}", secs, reading);
        count += 1;
    }

    if count == 0 {
        bail!(
            "{} has {} samples, fewer than one {}-sample block",
            path.display(),
            clip.len(),
            block_len
        );
    }

    Ok(())
}

fn run_listen(mut config: Config, blocks: Option<u64>, device: Option<String>) -> Result<()> {
    if device.is_some() {
        config.capture.device = device;
    }

    let mut monitor = StressMonitor::new(config.analysis.clone(), config.capture.clone());
    let readings = monitor
        .take_readings()
        .context("Reading channel already taken")?;

    let device_name = monitor.start().context("Failed to start microphone")?;
    println!("Listening on {}", device_name);
    println!("{}", PLACEHOLDER_LABEL);

    let mut seen = 0u64;
    loop {
        match readings.recv_timeout(Duration::from_secs(2)) {
            Ok(reading) => {
                println!("{}", reading);
                seen += 1;
                if blocks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                log::warn!("No audio block completed in the last 2 s");
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    monitor.stop();
    log::info!("Analyzed {} blocks", monitor.blocks_analyzed());
    Ok(())
}

fn run_devices() -> Result<()> {
    let devices = list_input_devices().context("Failed to list input devices")?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for device in devices {
        println!("{} ({} Hz, {} ch)", device.name, device.sample_rate, device.channels);
    }
    Ok(())
}
