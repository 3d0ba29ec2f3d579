//! Backend DMA sans périphérique : un thread minuteur termine chaque
//! transfert après sa durée de lecture théorique

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use log::{debug, error, warn};

use super::dma::SharedDma;
use super::error::{AudioError, AudioResult};
use super::traits::{AudioHardware, DmaCallback};
use crate::SAMPLE_RATE;

/// Attente maximale du thread quand aucun transfert n'est en cours
const IDLE_POLL: Duration = Duration::from_millis(5);

/// Moteur DMA virtuel cadencé par un thread
pub struct VirtualDma {
    dma: SharedDma,
    sample_rate: u32,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl VirtualDma {
    pub fn new() -> Self {
        Self {
            dma: SharedDma::new(),
            sample_rate: SAMPLE_RATE,
            stop_tx: None,
            handle: None,
        }
    }

    pub fn dma(&self) -> &SharedDma {
        &self.dma
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn spawn_timer(&mut self) -> AudioResult<()> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let dma = self.dma.clone();
        let sample_rate = self.sample_rate;

        let handle = thread::Builder::new()
            .name("virtual-dma".into())
            .spawn(move || {
                debug!("Thread DMA virtuel démarré à {}Hz", sample_rate);
                // Échéances absolues : chaque fin de transfert est calée sur
                // la précédente, pas sur l'instant de réveil du thread
                let mut period = dma.transfer_duration(sample_rate);
                let mut next = Instant::now() + if period.is_zero() { IDLE_POLL } else { period };
                loop {
                    match stop_rx.recv_deadline(next) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !period.is_zero() {
                                dma.complete_transfer();
                            }
                            let idle = period.is_zero();
                            period = dma.transfer_duration(sample_rate);
                            next = if period.is_zero() {
                                Instant::now() + IDLE_POLL
                            } else if idle {
                                Instant::now() + period
                            } else {
                                next + period
                            };
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Thread DMA virtuel arrêté");
            })
            .map_err(AudioError::Thread)?;

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        Ok(())
    }

    fn join_timer(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Le thread DMA virtuel s'est terminé sur une panique");
            }
        }
    }
}

impl Default for VirtualDma {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHardware for VirtualDma {
    fn set_sample_rate(&mut self, rate: u32) {
        self.sample_rate = rate;
    }

    fn register_dma_callback(&mut self, callback: Option<DmaCallback>) {
        self.dma.register_callback(callback);
    }

    fn init_dma(&mut self, data: &[u8]) {
        self.dma.arm(data);
    }

    fn start_dma(&mut self) {
        self.join_timer();
        self.dma.start();
        if let Err(e) = self.spawn_timer() {
            error!("Impossible de démarrer le DMA virtuel: {}", e);
            self.dma.stop();
        }
    }

    fn stop_dma(&mut self) {
        self.dma.stop();
        self.join_timer();
    }
}

impl Drop for VirtualDma {
    fn drop(&mut self) {
        self.join_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_completions_fire_while_running() {
        let mut hw = VirtualDma::new();
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        hw.register_dma_callback(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        // 48 trames à 48kHz : 1 ms par transfert
        hw.init_dma(&[0u8; 48 * 4]);
        hw.start_dma();
        thread::sleep(Duration::from_millis(60));
        hw.stop_dma();

        let fired = count.load(Ordering::SeqCst);
        assert!(fired > 0);
        assert!(!hw.dma().is_running());

        thread::sleep(Duration::from_millis(10));
        assert_eq!(count.load(Ordering::SeqCst), fired);
    }

    #[test]
    fn test_completion_rate_matches_transfer_length() {
        let mut hw = VirtualDma::new();
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        hw.register_dma_callback(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        // Trame 50Hz : 960 échantillons, 20 ms par transfert
        hw.init_dma(&[0u8; 960 * 4]);
        let started = Instant::now();
        hw.start_dma();
        thread::sleep(Duration::from_secs(2));
        let fired = count.load(Ordering::SeqCst);
        let elapsed = started.elapsed();
        hw.stop_dma();

        assert!(fired > 0);
        let period_us = elapsed.as_micros() as f64 / f64::from(fired);
        let error = (period_us - 20_000.0).abs() / 20_000.0;
        assert!(error < 0.005, "période effective {:.1} us", period_us);
    }
}
