//! Cadencement des trames : régions vidéo, compteur de trames et horloge VSYNC
//!
//! La boucle d'émulation ne démarre une nouvelle trame que lorsque le
//! compteur de trames est positif. Ce compteur est incrémenté soit par la
//! fin de chaque transfert DMA audio (mode 50Hz), soit par l'interruption
//! vidéo (mode 60Hz).

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Période VSYNC réelle de la sortie 60Hz en microsecondes
pub const NTSC_VSYNC_PERIOD_US: u64 = 16_715;

/// Période VSYNC de la sortie 50Hz en microsecondes
pub const PAL_VSYNC_PERIOD_US: u64 = 20_000;

/// Région vidéo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// 60Hz
    Ntsc,
    /// 50Hz
    Pal,
}

impl Region {
    pub fn is_pal(self) -> bool {
        self == Region::Pal
    }

    /// Période de rafraîchissement réelle de l'affichage
    pub fn vsync_period(self) -> Duration {
        match self {
            Region::Ntsc => Duration::from_micros(NTSC_VSYNC_PERIOD_US),
            Region::Pal => Duration::from_micros(PAL_VSYNC_PERIOD_US),
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::Ntsc
    }
}

/// Régime de cadencement actif pendant une session d'émulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// La fin des transferts DMA cadence les trames, pas de compensation
    DmaPaced,
    /// L'interruption vidéo cadence les trames, la longueur DMA alterne
    VsyncCompensated,
}

/// Combinaison région émulée / région de l'affichage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoTiming {
    /// Région du VDP émulé
    pub emulated: Region,
    /// Région de la sortie vidéo de la console hôte
    pub display: Region,
}

impl VideoTiming {
    pub fn new(emulated: Region, display: Region) -> Self {
        Self { emulated, display }
    }

    /// Timing 60Hz natif des deux côtés
    pub fn ntsc() -> Self {
        Self::new(Region::Ntsc, Region::Ntsc)
    }

    /// Timing 50Hz natif des deux côtés
    pub fn pal() -> Self {
        Self::new(Region::Pal, Region::Pal)
    }

    /// Dès qu'un côté tourne en 50Hz, la période DMA est plus longue que
    /// la période VSYNC et peut servir d'horloge sans saut de trame vidéo.
    pub fn sync_mode(&self) -> SyncMode {
        if self.emulated.is_pal() || self.display.is_pal() {
            SyncMode::DmaPaced
        } else {
            SyncMode::VsyncCompensated
        }
    }

    /// Nombre d'échantillons nominal par trame émulée
    pub fn nominal_frame_samples(&self) -> usize {
        if self.emulated.is_pal() {
            crate::PAL_FRAME_SAMPLES
        } else {
            crate::NTSC_FRAME_SAMPLES
        }
    }
}

/// Compteur de trames partagé entre la boucle d'émulation et les
/// callbacks matériels (DMA ou VSYNC)
#[derive(Debug, Clone, Default)]
pub struct FrameTicker {
    counter: Arc<AtomicU32>,
}

impl FrameTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signale qu'une période de trame s'est écoulée
    pub fn tick(&self) {
        self.counter.fetch_add(1, Ordering::AcqRel);
    }

    pub fn get(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }

    pub fn set(&self, value: u32) {
        self.counter.store(value, Ordering::Release);
    }

    pub fn reset(&self) {
        self.set(0);
    }

    /// Consomme une trame si disponible
    pub fn try_consume(&self) -> bool {
        self.counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1))
            .is_ok()
    }

    /// Ramène le compteur à une trame s'il en avait accumulé davantage.
    /// Retourne la valeur avant correction.
    pub fn clamp_to_one(&self) -> u32 {
        match self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| (v > 1).then_some(1))
        {
            Ok(previous) | Err(previous) => previous,
        }
    }
}

/// Substitut hébergé de l'interruption vidéo : un thread qui incrémente
/// le compteur de trames à chaque période VSYNC
pub struct VsyncClock {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl VsyncClock {
    /// Démarre l'horloge pour la région d'affichage donnée
    pub fn spawn(region: Region, ticker: FrameTicker) -> std::io::Result<Self> {
        Self::with_period(region.vsync_period(), ticker)
    }

    pub fn with_period(period: Duration, ticker: FrameTicker) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("vsync-clock".into())
            .spawn(move || {
                debug!("Horloge VSYNC démarrée ({} us)", period.as_micros());
                // Échéances absolues : la latence de réveil ne s'accumule pas
                let mut next = Instant::now() + period;
                loop {
                    match stop_rx.recv_deadline(next) {
                        Err(RecvTimeoutError::Timeout) => {
                            ticker.tick();
                            next += period;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Horloge VSYNC arrêtée");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Arrête le thread et attend sa fin
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Le thread VSYNC s'est terminé sur une panique");
            }
        }
    }
}

impl Drop for VsyncClock {
    fn drop(&mut self) {
        self.stop();
    }
}
