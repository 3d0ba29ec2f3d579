//! Tests de bout en bout avec le DMA virtuel cadencé par minuteur

mod common;

use common::RecordingMenu;
use gx_audio_sync::*;
use std::thread;
use std::time::{Duration, Instant};

/// Exécute `frames` trames cadencées par le compteur, avec délai maximal
fn run_paced(sync: &mut FrameAudioSync<VirtualDma, RecordingMenu>, frames: usize) -> Duration {
    let mut source = SilenceSource;
    let ticker = sync.ticker().clone();
    let started = Instant::now();
    let deadline = started + Duration::from_secs(5);

    sync.update(&mut source);
    for _ in 1..frames {
        while !ticker.try_consume() {
            assert!(Instant::now() < deadline, "le DMA virtuel ne cadence plus les trames");
            thread::sleep(Duration::from_micros(200));
        }
        sync.update(&mut source);
    }
    started.elapsed()
}

#[test]
fn test_virtual_dma_paces_pal_frames() {
    let mut sync = FrameAudioSync::new(
        VirtualDma::new(),
        RecordingMenu::default(),
        FrameTicker::new(),
        100,
    );
    sync.start(VideoTiming::pal());

    let elapsed = run_paced(&mut sync, 6);
    sync.stop();

    // Cinq attentes d'un transfert de 20 ms
    assert!(elapsed >= Duration::from_millis(90), "trop rapide: {:?}", elapsed);
    assert_eq!(sync.stats().frames, 6);
    assert!(!sync.hardware().dma().is_running());
}

#[test]
fn test_vsync_clock_paces_ntsc_frames() {
    let ticker = FrameTicker::new();
    let mut sync = FrameAudioSync::new(
        VirtualDma::new(),
        RecordingMenu::default(),
        ticker.clone(),
        100,
    );
    sync.start(VideoTiming::ntsc());
    let mut clock = VsyncClock::spawn(Region::Ntsc, ticker).unwrap();

    run_paced(&mut sync, 5);
    clock.stop();
    sync.stop();

    // Aucun callback DMA en 60Hz : seul le VSYNC incrémente le compteur
    assert_eq!(sync.stats().frames, 5);
    assert!(sync.stats().samples >= 5 * 800);
}
