//! Compensation de dérive entre période DMA et période VSYNC
//!
//! En 60Hz, la période VSYNC réelle (16715 us) correspond à 802.32
//! échantillons à 48kHz. La longueur d'un transfert DMA devant être un
//! multiple de 32 octets, on alterne entre 800 et 808 échantillons selon
//! l'écart cumulé (en centièmes d'échantillon) entre échantillons émis et
//! échantillons attendus.

use log::trace;

use crate::{NTSC_ALT_FRAME_SAMPLES, NTSC_FRAME_SAMPLES};

/// Accumulateur de dérive à point fixe (x100)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftCompensator {
    /// Longueur de la prochaine trame en échantillons
    frame_len: usize,

    /// Échantillons attendus par trame x100, 0 = pas de compensation
    sync_target: i64,

    /// Écart cumulé entre échantillons émis et attendus, x100
    delta: i64,
}

impl DriftCompensator {
    pub fn new(frame_len: usize, sync_target: i64) -> Self {
        Self {
            frame_len,
            sync_target,
            delta: 0,
        }
    }

    /// Réinitialise l'accumulateur pour une nouvelle session
    pub fn reset(&mut self, frame_len: usize, sync_target: i64) {
        self.frame_len = frame_len;
        self.sync_target = sync_target;
        self.delta = 0;
    }

    pub fn is_active(&self) -> bool {
        self.sync_target != 0
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn sync_target(&self) -> i64 {
        self.sync_target
    }

    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Intègre la trame qui vient d'être demandée au mixeur et choisit la
    /// longueur de la suivante. Retourne la nouvelle longueur.
    pub fn advance(&mut self, requested: usize) -> usize {
        if self.sync_target != 0 {
            self.delta += requested as i64 * 100 - self.sync_target;
            self.frame_len = if self.delta < 0 {
                NTSC_ALT_FRAME_SAMPLES
            } else {
                NTSC_FRAME_SAMPLES
            };
            trace!("dérive {} -> trame de {} échantillons", self.delta, self.frame_len);
        }
        self.frame_len
    }
}
