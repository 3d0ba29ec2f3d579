//! Modèle hébergé d'un moteur DMA audio à redémarrage automatique
//!
//! `arm` enregistre les paramètres du prochain transfert. Quand le
//! transfert en cours se termine, le moteur recharge le dernier transfert
//! armé (ou rejoue le même s'il n'a pas été réarmé) et compte une fin de
//! transfert. Les backends invoquent le callback après avoir relâché le
//! verrou du moteur.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::traits::DmaCallback;
use crate::BYTES_PER_SAMPLE;

/// État du moteur DMA
#[derive(Debug, Default)]
pub struct DmaEngine {
    /// Dernier transfert armé
    armed: Vec<i16>,

    /// Transfert en cours de lecture
    playing: Vec<i16>,

    /// Position de lecture dans `playing`
    position: usize,

    running: bool,

    /// Nombre de transferts armés depuis la création
    armed_count: u64,

    /// Nombre de transferts terminés depuis le dernier `start`
    completed: u64,
}

impl DmaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copie le transfert armé (lecture DMA de la mémoire). Un octet
    /// final isolé est ignoré.
    pub fn arm(&mut self, data: &[u8]) {
        let data = &data[..data.len() & !1];
        self.armed.clear();
        match bytemuck::try_cast_slice::<u8, i16>(data) {
            Ok(samples) => self.armed.extend_from_slice(samples),
            // Source non alignée sur 2 octets
            Err(_) => self.armed.extend(
                data.chunks_exact(2)
                    .map(bytemuck::pod_read_unaligned::<i16>),
            ),
        }
        self.armed_count += 1;
    }

    /// Lance le transfert armé
    pub fn start(&mut self) {
        self.playing.clone_from(&self.armed);
        self.position = 0;
        self.completed = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.playing.clear();
        self.position = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn armed_count(&self) -> u64 {
        self.armed_count
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Longueur du transfert en cours en octets
    pub fn playing_len(&self) -> usize {
        self.playing.len() * 2
    }

    /// Durée de lecture du transfert en cours
    pub fn transfer_duration(&self, sample_rate: u32) -> Duration {
        let frames = (self.playing_len() / BYTES_PER_SAMPLE) as u64;
        if sample_rate == 0 || frames == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(frames * 1_000_000_000 / u64::from(sample_rate))
    }

    /// Termine le transfert en cours et recharge le dernier armé.
    /// Retourne `false` si le moteur est arrêté.
    pub fn complete_transfer(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.playing.clone_from(&self.armed);
        self.position = 0;
        self.completed += 1;
        true
    }

    /// Remplit `out` (échantillons entrelacés) depuis le flux DMA et
    /// retourne le nombre de transferts terminés pendant la lecture.
    pub fn render(&mut self, out: &mut [i16]) -> u32 {
        if !self.running || self.playing.is_empty() {
            out.fill(0);
            return 0;
        }

        let mut completions = 0;
        let mut written = 0;
        while written < out.len() {
            let available = &self.playing[self.position..];
            let count = available.len().min(out.len() - written);
            out[written..written + count].copy_from_slice(&available[..count]);
            written += count;
            self.position += count;

            if self.position >= self.playing.len() {
                self.complete_transfer();
                completions += 1;
                if self.playing.is_empty() {
                    out[written..].fill(0);
                    break;
                }
            }
        }
        completions
    }
}

struct SharedState {
    engine: DmaEngine,
    callback: Option<DmaCallback>,
}

/// Moteur DMA partagé entre le thread d'émulation et le contexte de
/// lecture (callback audio ou thread minuteur)
#[derive(Clone)]
pub struct SharedDma {
    inner: Arc<Mutex<SharedState>>,
}

impl SharedDma {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedState {
                engine: DmaEngine::new(),
                callback: None,
            })),
        }
    }

    pub fn register_callback(&self, callback: Option<DmaCallback>) {
        self.inner.lock().callback = callback;
    }

    pub fn arm(&self, data: &[u8]) {
        self.inner.lock().engine.arm(data);
    }

    pub fn start(&self) {
        self.inner.lock().engine.start();
    }

    pub fn stop(&self) {
        self.inner.lock().engine.stop();
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().engine.is_running()
    }

    pub fn completed(&self) -> u64 {
        self.inner.lock().engine.completed()
    }

    pub fn transfer_duration(&self, sample_rate: u32) -> Duration {
        self.inner.lock().engine.transfer_duration(sample_rate)
    }

    /// Lit le flux DMA puis signale les fins de transfert hors verrou
    pub fn render(&self, out: &mut [i16]) -> u32 {
        let (completions, callback) = {
            let mut state = self.inner.lock();
            let completions = state.engine.render(out);
            (completions, state.callback.clone())
        };
        Self::notify(completions, callback);
        completions
    }

    /// Termine le transfert en cours (backends cadencés par minuteur)
    pub fn complete_transfer(&self) -> bool {
        let (completed, callback) = {
            let mut state = self.inner.lock();
            (state.engine.complete_transfer(), state.callback.clone())
        };
        if completed {
            Self::notify(1, callback);
        }
        completed
    }

    fn notify(completions: u32, callback: Option<DmaCallback>) {
        if let Some(callback) = callback {
            for _ in 0..completions {
                callback();
            }
        }
    }
}

impl Default for SharedDma {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedDma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SharedDma")
            .field("engine", &state.engine)
            .field("callback", &state.callback.is_some())
            .finish()
    }
}
