//! Doublures de test : matériel, mixeur et menu enregistrant leurs appels

#![allow(dead_code)]

use gx_audio_sync::*;

/// Appel au matériel audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    SetSampleRate(u32),
    RegisterCallback(bool),
    Flush { address: usize, len: usize },
    Arm { address: usize, len: usize },
    Start,
    Stop,
}

/// Matériel audio qui enregistre chaque appel
#[derive(Default)]
pub struct RecordingHardware {
    pub events: Vec<HwEvent>,
    pub callback: Option<DmaCallback>,
    /// Copie des données de chaque transfert armé
    pub transfers: Vec<Vec<u8>>,
}

impl RecordingHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event: &HwEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn arms(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HwEvent::Arm { address, len } => Some((*address, *len)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.transfers.clear();
    }
}

impl AudioHardware for RecordingHardware {
    fn set_sample_rate(&mut self, rate: u32) {
        self.events.push(HwEvent::SetSampleRate(rate));
    }

    fn register_dma_callback(&mut self, callback: Option<DmaCallback>) {
        self.events.push(HwEvent::RegisterCallback(callback.is_some()));
        self.callback = callback;
    }

    fn init_dma(&mut self, data: &[u8]) {
        self.events.push(HwEvent::Arm {
            address: data.as_ptr() as usize,
            len: data.len(),
        });
        self.transfers.push(data.to_vec());
    }

    fn start_dma(&mut self) {
        self.events.push(HwEvent::Start);
    }

    fn stop_dma(&mut self) {
        self.events.push(HwEvent::Stop);
    }

    fn flush_range(&mut self, data: &[u8]) {
        self.events.push(HwEvent::Flush {
            address: data.as_ptr() as usize,
            len: data.len(),
        });
    }
}

/// Matériel branché sur le modèle DMA hébergé
#[derive(Default)]
pub struct LoopbackHardware {
    pub dma: SharedDma,
}

impl AudioHardware for LoopbackHardware {
    fn set_sample_rate(&mut self, _rate: u32) {}

    fn register_dma_callback(&mut self, callback: Option<DmaCallback>) {
        self.dma.register_callback(callback);
    }

    fn init_dma(&mut self, data: &[u8]) {
        self.dma.arm(data);
    }

    fn start_dma(&mut self) {
        self.dma.start();
    }

    fn stop_dma(&mut self) {
        self.dma.stop();
    }
}

/// Mixeur produisant une rampe et enregistrant chaque remplissage
#[derive(Default)]
pub struct RampSource {
    next: i16,
    /// (adresse du tampon rempli, nombre de trames)
    pub fills: Vec<(usize, usize)>,
    /// Échantillons produits pour chaque trame
    pub frames: Vec<Vec<i16>>,
}

impl RampSource {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }
}

impl SampleSource for RampSource {
    fn produce_samples(&mut self, count: usize, out: &mut [i16]) {
        assert_eq!(out.len(), count * 2);
        self.fills.push((out.as_ptr() as usize, count));
        for sample in out.iter_mut() {
            *sample = self.next;
            self.next = self.next.wrapping_add(1);
        }
        self.frames.push(out.to_vec());
    }
}

/// Menu audio qui enregistre chaque appel
#[derive(Debug, Default)]
pub struct RecordingMenu {
    pub calls: Vec<String>,
    pub music: bool,
}

impl RecordingMenu {
    pub fn with_music() -> Self {
        Self {
            calls: Vec::new(),
            music: true,
        }
    }
}

impl MenuAudio for RecordingMenu {
    fn pause_music(&mut self, paused: bool) {
        self.calls.push(format!("pause({})", paused));
    }

    fn stop_music(&mut self) {
        self.calls.push("stop".to_string());
    }

    fn shutdown(&mut self) {
        self.calls.push("shutdown".to_string());
    }

    fn init(&mut self) {
        self.calls.push("init".to_string());
    }

    fn has_music(&self) -> bool {
        self.music
    }

    fn play_music(&mut self, volume: u8) {
        self.calls.push(format!("play({})", volume));
    }
}

pub type TestSync = FrameAudioSync<RecordingHardware, RecordingMenu>;

pub fn recording_sync() -> TestSync {
    FrameAudioSync::new(
        RecordingHardware::new(),
        RecordingMenu::default(),
        FrameTicker::new(),
        100,
    )
}
