//! Synchroniseur audio par trame
//!
//! Appelé à la fin de chaque trame émulée : récupère les échantillons de la
//! trame dans le tampon de travail puis arme le transfert DMA suivant. Les
//! paramètres armés ne sont pris en compte qu'à la fin du transfert en
//! cours, ce qui garantit que le tampon actif n'est jamais modifié.

use std::sync::Arc;

use log::{debug, error, info};

use super::buffer::DoubleBuffer;
use super::drift::DriftCompensator;
use super::traits::{AudioHardware, DmaCallback, MenuAudio, SampleSource};
use crate::timing::{FrameTicker, SyncMode, VideoTiming};
use crate::{BYTES_PER_SAMPLE, NTSC_DRIFT_SYNC, NTSC_FRAME_SAMPLES, SAMPLE_RATE};

/// État du synchroniseur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// L'audio appartient au menu
    Idle,
    /// Session d'émulation en cours
    Synchronizing,
}

/// Statistiques de la session en cours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Trames traitées depuis le dernier `start`
    pub frames: u64,
    /// Échantillons demandés au mixeur
    pub samples: u64,
    /// Trames de longueur alternative (808)
    pub long_frames: u64,
    /// Plus grand écart absolu observé, x100
    pub max_drift: i64,
}

impl SyncStats {
    /// Nombre moyen d'échantillons par trame
    pub fn average_frame_samples(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.samples as f64 / self.frames as f64
        }
    }
}

/// Synchroniseur audio/vidéo à double tampon DMA
pub struct FrameAudioSync<H: AudioHardware, M: MenuAudio> {
    hardware: H,
    menu: M,
    buffers: DoubleBuffer,
    drift: DriftCompensator,
    ticker: FrameTicker,
    state: SyncState,
    sync_mode: SyncMode,

    /// Le premier transfert a été lancé
    started: bool,

    /// Volume de la musique du menu (0-100)
    music_volume: u8,

    stats: SyncStats,
}

impl<H: AudioHardware, M: MenuAudio> FrameAudioSync<H, M> {
    /// Crée un synchroniseur inactif. `music_volume` est sur 0-100.
    pub fn new(hardware: H, menu: M, ticker: FrameTicker, music_volume: u8) -> Self {
        Self {
            hardware,
            menu,
            buffers: DoubleBuffer::new(),
            drift: DriftCompensator::new(NTSC_FRAME_SAMPLES, 0),
            ticker,
            state: SyncState::Idle,
            sync_mode: SyncMode::DmaPaced,
            started: false,
            music_volume: music_volume.min(100),
            stats: SyncStats::default(),
        }
    }

    /// Réinitialise le moteur audio au retour du menu
    pub fn start(&mut self, timing: VideoTiming) {
        // Couper l'audio du menu
        self.menu.pause_music(true);
        self.menu.stop_music();
        self.menu.shutdown();

        self.sync_mode = timing.sync_mode();
        self.drift.reset(timing.nominal_frame_samples(), 0);
        self.buffers.reset();
        self.started = false;
        self.stats = SyncStats::default();

        self.hardware.set_sample_rate(SAMPLE_RATE);
        self.hardware.register_dma_callback(None);

        match self.sync_mode {
            SyncMode::DmaPaced => {
                let ticker = self.ticker.clone();
                let callback: DmaCallback = Arc::new(move || ticker.tick());
                self.hardware.register_dma_callback(Some(callback));
            }
            SyncMode::VsyncCompensated => {
                self.drift.reset(timing.nominal_frame_samples(), NTSC_DRIFT_SYNC);
            }
        }

        self.state = SyncState::Synchronizing;
        debug!(
            "Audio démarré: {:?}, {} échantillons/trame, cible {}",
            self.sync_mode,
            self.drift.frame_len(),
            self.drift.sync_target()
        );
    }

    /// Traite la fin d'une trame émulée.
    ///
    /// Doit être appelé une fois par trame après `start`. Hors session,
    /// l'appel panique en debug et n'a aucun effet en release.
    pub fn update<S: SampleSource + ?Sized>(&mut self, source: &mut S) {
        debug_assert!(
            self.state == SyncState::Synchronizing,
            "FrameAudioSync::update appelé hors session"
        );
        if self.state != SyncState::Synchronizing {
            error!("update ignoré: synchroniseur inactif");
            return;
        }

        let count = self.drift.frame_len();
        let size = count * BYTES_PER_SAMPLE;

        // Échantillons de la trame dans le tampon de travail
        let work = self.buffers.work_mut();
        source.produce_samples(count, &mut work.samples_mut()[..count * 2]);

        // Le tampon rempli devient le prochain tampon DMA
        let filled = self.buffers.swap();
        let data = &self.buffers.buffer(filled).as_bytes()[..size];
        self.hardware.flush_range(data);
        self.hardware.init_dma(data);

        // Le DMA redémarre ensuite automatiquement avec les derniers paramètres
        if !self.started {
            self.started = true;
            self.hardware.start_dma();
            let pending = self.ticker.clamp_to_one();
            if pending > 1 {
                debug!("Compteur de trames ramené de {} à 1", pending);
            }
        }

        self.drift.advance(count);

        self.stats.frames += 1;
        self.stats.samples += count as u64;
        if count != NTSC_FRAME_SAMPLES && self.drift.is_active() {
            self.stats.long_frames += 1;
        }
        self.stats.max_drift = self.stats.max_drift.max(self.drift.delta().abs());
    }

    /// Arrête l'audio de l'émulateur et rend la main au menu.
    ///
    /// Même précondition que `update`.
    pub fn stop(&mut self) {
        debug_assert!(
            self.state == SyncState::Synchronizing,
            "FrameAudioSync::stop appelé hors session"
        );
        if self.state != SyncState::Synchronizing {
            error!("stop ignoré: synchroniseur inactif");
            return;
        }

        self.hardware.stop_dma();
        self.started = false;
        self.state = SyncState::Idle;

        info!(
            "Audio arrêté après {} trames ({:.2} échantillons/trame)",
            self.stats.frames,
            self.stats.average_frame_samples()
        );

        // Relancer l'audio du menu
        self.menu.init();
        if self.menu.has_music() {
            self.menu.pause_music(false);
            self.menu.play_music(self.menu_volume());
        }
    }

    /// Volume de la musique converti sur 0-255
    fn menu_volume(&self) -> u8 {
        (u32::from(self.music_volume) * 255 / 100) as u8
    }

    pub fn set_music_volume(&mut self, volume: u8) {
        self.music_volume = volume.min(100);
    }

    pub fn music_volume(&self) -> u8 {
        self.music_volume
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Longueur de la prochaine trame en échantillons
    pub fn frame_len(&self) -> usize {
        self.drift.frame_len()
    }

    /// Écart de dérive cumulé, x100
    pub fn drift(&self) -> i64 {
        self.drift.delta()
    }

    pub fn drift_target(&self) -> i64 {
        self.drift.sync_target()
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn ticker(&self) -> &FrameTicker {
        &self.ticker
    }

    pub fn buffers(&self) -> &DoubleBuffer {
        &self.buffers
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn menu(&self) -> &M {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut M {
        &mut self.menu
    }

    /// Rend les collaborateurs
    pub fn into_parts(self) -> (H, M) {
        (self.hardware, self.menu)
    }
}
