//! Interfaces des collaborateurs du synchroniseur
//!
//! Le mixeur du processeur sonore émulé, le matériel audio (DMA) et
//! l'audio du menu sont fournis par l'appelant.

use std::sync::Arc;

/// Callback appelé à la fin de chaque transfert DMA.
///
/// Peut être invoqué depuis un contexte d'interruption ou un autre thread.
pub type DmaCallback = Arc<dyn Fn() + Send + Sync>;

/// Mixeur du processeur sonore émulé
pub trait SampleSource {
    /// Écrit exactement `count` trames stéréo entrelacées dans `out`
    /// (`out.len() == count * 2`).
    fn produce_samples(&mut self, count: usize, out: &mut [i16]);
}

/// Primitives du sous-système audio matériel
pub trait AudioHardware {
    /// Configure la fréquence d'échantillonnage de sortie
    fn set_sample_rate(&mut self, rate: u32);

    /// Enregistre (ou retire avec `None`) le callback de fin de transfert
    fn register_dma_callback(&mut self, callback: Option<DmaCallback>);

    /// Arme le prochain transfert. Les paramètres sont pris en compte à la
    /// fin du transfert en cours.
    fn init_dma(&mut self, data: &[u8]);

    /// Lance le premier transfert. Les suivants redémarrent automatiquement.
    fn start_dma(&mut self);

    /// Arrête le moteur DMA
    fn stop_dma(&mut self);

    /// Vide le cache processeur sur la plage donnée avant lecture par le DMA
    fn flush_range(&mut self, _data: &[u8]) {}
}

/// Audio propre au menu (musique de fond)
pub trait MenuAudio {
    /// Met en pause ou reprend la musique de fond
    fn pause_music(&mut self, paused: bool);

    /// Arrête la musique de fond
    fn stop_music(&mut self);

    /// Libère le mixeur du menu
    fn shutdown(&mut self);

    /// Réinitialise le mixeur du menu
    fn init(&mut self);

    /// Une musique de fond est-elle chargée ?
    fn has_music(&self) -> bool;

    /// Joue la musique de fond en boucle, volume sur 0-255
    fn play_music(&mut self, volume: u8);
}

impl<T: SampleSource + ?Sized> SampleSource for &mut T {
    fn produce_samples(&mut self, count: usize, out: &mut [i16]) {
        (**self).produce_samples(count, out)
    }
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn produce_samples(&mut self, count: usize, out: &mut [i16]) {
        (**self).produce_samples(count, out)
    }
}

impl<T: AudioHardware + ?Sized> AudioHardware for Box<T> {
    fn set_sample_rate(&mut self, rate: u32) {
        (**self).set_sample_rate(rate)
    }

    fn register_dma_callback(&mut self, callback: Option<DmaCallback>) {
        (**self).register_dma_callback(callback)
    }

    fn init_dma(&mut self, data: &[u8]) {
        (**self).init_dma(data)
    }

    fn start_dma(&mut self) {
        (**self).start_dma()
    }

    fn stop_dma(&mut self) {
        (**self).stop_dma()
    }

    fn flush_range(&mut self, data: &[u8]) {
        (**self).flush_range(data)
    }
}
