//! tonebank - A bank of independently streamed waveform oscillators

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonebank::config::{self, SynthConfig};
use tonebank::engine::{self, AudioContext, Mixer, OfflineContext, Recorder};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            duration,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            let mut mixer = Mixer::open(cfg.audio.sample_rate, cfg.audio.device.as_deref())
                .context("failed to open audio output")?;
            add_oscillators(&mut mixer, &cfg);

            println!("Playing {} oscillators at {} Hz", mixer.len(), mixer.sample_rate());
            for (i, osc) in mixer.oscillators().iter().enumerate() {
                println!(
                    "  {}: {} {:.0} Hz, amplitude {:.0}%, pan {:+.2}",
                    i,
                    osc.shape_name(),
                    osc.frequency(),
                    osc.amplitude() * 100.0,
                    osc.pan()
                );
            }

            let running = Arc::new(AtomicBool::new(true));
            let handler_flag = running.clone();
            ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
                .context("failed to install Ctrl-C handler")?;

            match duration {
                Some(secs) => println!("\nStopping after {}s (Ctrl-C to stop early)", secs),
                None => println!("\nPress Ctrl-C to stop"),
            }

            let started = Instant::now();
            let limit = duration.map(Duration::from_secs);
            while running.load(Ordering::SeqCst) && limit.map_or(true, |l| started.elapsed() < l) {
                std::thread::sleep(Duration::from_millis(50));
            }

            drop(mixer);
            println!("Stopped.");
        }

        Commands::Record {
            config: config_path,
            output,
            duration,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            let mut mixer = Mixer::new(OfflineContext::new(cfg.audio.sample_rate));
            add_oscillators(&mut mixer, &cfg);

            let sample_rate = mixer.sample_rate();
            let total_frames = sample_rate as u64 * duration;
            println!(
                "Recording {} seconds of {} oscillators...",
                duration,
                mixer.len()
            );

            for index in 0..mixer.len() {
                let Some(player) = mixer.player(index) else {
                    continue;
                };

                let path = numbered_path(&output, index);
                let mut recorder = Recorder::new(&path, sample_rate)?;
                recorder.record(total_frames, cfg.audio.block_frames, |buf| player.pull(buf))?;
                recorder.finalize()?;

                println!("  Recorded oscillator {} to {:?}", index, path);
            }
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            if let Some(name) = engine::default_device_name() {
                println!("Default output: {}\n", name);
            }

            println!("Output devices:");
            let devices = engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Block size: {} frames", cfg.audio.block_frames);
                    println!(
                        "  Device: {}",
                        cfg.audio.device.as_deref().unwrap_or("(default)")
                    );
                    println!("  Oscillators: {}", cfg.oscillators.len());
                    for osc in &cfg.oscillators {
                        println!(
                            "    - {} {} Hz, amplitude {}, pan {}",
                            osc.shape, osc.frequency, osc.amplitude, osc.pan
                        );
                    }
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = "tonebank.yaml";
            if Path::new(path).exists() {
                println!("tonebank.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_CONFIG)?;
                println!("Created tonebank.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Create one oscillator per config entry, in order
fn add_oscillators<C: AudioContext>(mixer: &mut Mixer<C>, cfg: &SynthConfig) {
    for osc_cfg in &cfg.oscillators {
        mixer.apply(osc_cfg);
    }
}

/// `out.wav` -> `out-0.wav`, `out-1.wav`, ...
fn numbered_path(base: &Path, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "oscillator".to_string());
    base.with_file_name(format!("{}-{}.wav", stem, index))
}
