use anyhow::Result;
use gx_audio_sync::*;
use log::{info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

/// Attente entre deux lectures du compteur de trames
const TICKER_POLL: Duration = Duration::from_micros(500);

fn main() -> Result<()> {
    // Initialiser le logging
    env_logger::init();
    info!("GX Audio Sync v{}", VERSION);

    // Traitement simple des arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<String> = None;
    let mut frames: Option<u64> = None;
    let mut headless = false;
    let mut tone = false;
    let mut emulated_pal = false;
    let mut display_pal = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_path = Some(args[i + 1].clone());
                i += 1;
            }
            "--frames" if i + 1 < args.len() => {
                frames = Some(args[i + 1].parse()?);
                i += 1;
            }
            "--headless" => headless = true,
            "--tone" => tone = true,
            "--pal" => emulated_pal = true,
            "--pal-display" => display_pal = true,
            other => warn!("Argument ignoré: {}", other),
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => EmulatorConfig::load_from_file(path)?,
        None => EmulatorConfig::default(),
    };
    if let Some(frames) = frames {
        config.emulation.frames = frames;
    }
    if emulated_pal {
        config.emulation.emulated_region = Region::Pal;
    }
    if display_pal {
        config.video.display_region = Region::Pal;
    }
    if headless || !config.audio.enabled {
        config.audio.backend = AudioBackend::Virtual;
    }
    config.validate()?;

    let menu = match &config.audio.bgm_path {
        Some(dir) => BackgroundMusic::load_from_dir(dir)?,
        None => BackgroundMusic::new(),
    };

    let hardware: Box<dyn AudioHardware> = match config.audio.backend {
        AudioBackend::Cpal => match CpalDma::new() {
            Ok(hw) => Box::new(hw),
            Err(e) => {
                warn!("{}, utilisation du DMA virtuel", e);
                Box::new(VirtualDma::new())
            }
        },
        AudioBackend::Virtual => Box::new(VirtualDma::new()),
    };

    let mut source: Box<dyn SampleSource> = if tone {
        // Onde carrée de 1kHz à 48kHz
        let pattern = (0..48)
            .map(|n| if n < 24 { (4000, 4000) } else { (-4000, -4000) })
            .collect();
        Box::new(PatternSource::new(pattern))
    } else {
        Box::new(SilenceSource)
    };

    run(&config, hardware, menu, source.as_mut())
}

fn run(
    config: &EmulatorConfig,
    hardware: Box<dyn AudioHardware>,
    menu: BackgroundMusic,
    source: &mut dyn SampleSource,
) -> Result<()> {
    let timing = config.video_timing();
    let ticker = FrameTicker::new();
    let mut sync = FrameAudioSync::new(hardware, menu, ticker.clone(), config.audio.bgm_volume);

    sync.start(timing);
    info!(
        "Émulation {:?} sur affichage {:?}: {:?}",
        timing.emulated,
        timing.display,
        sync.sync_mode()
    );

    // En 60Hz, l'interruption vidéo cadence les trames
    let _vsync = match sync.sync_mode() {
        SyncMode::VsyncCompensated => Some(VsyncClock::spawn(timing.display, ticker.clone())?),
        SyncMode::DmaPaced => None,
    };

    let started = Instant::now();
    let mut frame: u64 = 0;
    while config.emulation.frames == 0 || frame < config.emulation.frames {
        // La première trame lance le DMA, les suivantes attendent le compteur
        if frame > 0 {
            while !ticker.try_consume() {
                thread::sleep(TICKER_POLL);
            }
        }
        sync.update(source);
        frame += 1;
    }

    let elapsed = started.elapsed();
    let stats = *sync.stats();
    sync.stop();

    info!(
        "{} trames en {:.2}s ({:.2} trames/s), {:.2} échantillons/trame, dérive max {}",
        stats.frames,
        elapsed.as_secs_f64(),
        stats.frames as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        stats.average_frame_samples(),
        stats.max_drift
    );
    Ok(())
}
