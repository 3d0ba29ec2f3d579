//! Backend DMA hébergé sur un flux de sortie cpal
//!
//! Le callback du flux cpal joue le rôle du moteur DMA : il lit le
//! transfert en cours et signale chaque fin de transfert.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig, SupportedBufferSize};
use log::{debug, error, warn};

use super::dma::SharedDma;
use super::error::{AudioError, AudioResult};
use super::traits::{AudioHardware, DmaCallback};
use crate::SAMPLE_RATE;

/// Taille du tampon intermédiaire quand le pilote ne la précise pas
const DEFAULT_SCRATCH_FRAMES: usize = 4096;

/// Borne haute du tampon intermédiaire, les blocs plus longs sont lus
/// en plusieurs passes
const MAX_SCRATCH_FRAMES: usize = 16_384;

/// Sortie audio cpal pilotée comme un moteur DMA
pub struct CpalDma {
    device: cpal::Device,
    sample_format: SampleFormat,
    channels: u16,
    sample_rate: u32,
    dma: SharedDma,

    /// Trames stéréo du tampon intermédiaire, alloué une fois par flux
    scratch_frames: usize,

    /// Flux actif et fréquence avec laquelle il a été créé
    stream: Option<(Stream, u32)>,
}

impl CpalDma {
    /// Ouvre le périphérique de sortie par défaut
    pub fn new() -> AudioResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        if !matches!(sample_format, SampleFormat::F32 | SampleFormat::I16) {
            return Err(AudioError::UnsupportedFormat(format!("{:?}", sample_format)));
        }

        let scratch_frames = scratch_frames(config.buffer_size());
        debug!(
            "Périphérique audio: {} canaux, format {:?}, tampon {} trames",
            config.channels(),
            sample_format,
            scratch_frames
        );

        Ok(Self {
            device,
            sample_format,
            channels: config.channels(),
            sample_rate: SAMPLE_RATE,
            dma: SharedDma::new(),
            scratch_frames,
            stream: None,
        })
    }

    pub fn dma(&self) -> &SharedDma {
        &self.dma
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn build_stream(&self) -> AudioResult<Stream> {
        let config = StreamConfig {
            channels: self.channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let channels = usize::from(self.channels.max(1));
        let dma = self.dma.clone();
        // Aucune allocation dans le callback temps réel
        let mut scratch = vec![0i16; self.scratch_frames * 2];

        let stream = match self.sample_format {
            SampleFormat::F32 => self.device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render_frames(&dma, &mut scratch, data, channels, |s| {
                        f32::from(s) / 32768.0
                    });
                },
                |err| error!("Erreur du flux audio: {}", err),
                None,
            )?,
            SampleFormat::I16 => self.device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    render_frames(&dma, &mut scratch, data, channels, |s| s);
                },
                |err| error!("Erreur du flux audio: {}", err),
                None,
            )?,
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        };
        Ok(stream)
    }

    fn ensure_stream(&mut self) -> AudioResult<&Stream> {
        let stale = !matches!(&self.stream, Some((_, rate)) if *rate == self.sample_rate);
        if stale {
            self.stream = None;
            let stream = self.build_stream()?;
            self.stream = Some((stream, self.sample_rate));
        }
        match &self.stream {
            Some((stream, _)) => Ok(stream),
            None => Err(AudioError::NoOutputDevice),
        }
    }
}

fn scratch_frames(buffer_size: &SupportedBufferSize) -> usize {
    match buffer_size {
        SupportedBufferSize::Range { max, .. } => {
            (*max as usize).clamp(1, MAX_SCRATCH_FRAMES)
        }
        SupportedBufferSize::Unknown => DEFAULT_SCRATCH_FRAMES,
    }
}

/// Lit les trames stéréo du DMA et les répartit sur les canaux du
/// périphérique, par blocs de la taille de `scratch`
fn render_frames<T: Copy + Default>(
    dma: &SharedDma,
    scratch: &mut [i16],
    out: &mut [T],
    channels: usize,
    convert: impl Fn(i16) -> T,
) {
    let block_frames = scratch.len() / 2;
    if block_frames == 0 {
        out.fill(T::default());
        return;
    }

    for block in out.chunks_mut(block_frames * channels) {
        let frames = block.len() / channels;
        let stereo_block = &mut scratch[..frames * 2];
        dma.render(stereo_block);

        for (frame, stereo) in block.chunks_exact_mut(channels).zip(stereo_block.chunks_exact(2)) {
            if channels == 1 {
                let mono = (i32::from(stereo[0]) + i32::from(stereo[1])) / 2;
                frame[0] = convert(mono as i16);
                continue;
            }
            frame[0] = convert(stereo[0]);
            frame[1] = convert(stereo[1]);
            for sample in &mut frame[2..] {
                *sample = T::default();
            }
        }
    }
}

impl AudioHardware for CpalDma {
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
        self.dma.start();
        let result = self
            .ensure_stream()
            .and_then(|stream| stream.play().map_err(AudioError::from));
        if let Err(e) = result {
            error!("Impossible de démarrer le DMA audio: {}", e);
            self.dma.stop();
        }
    }

    fn stop_dma(&mut self) {
        self.dma.stop();
        if let Some((stream, _)) = &self.stream {
            if let Err(e) = stream.pause() {
                warn!("Impossible de mettre le flux audio en pause: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    #[test]
    fn test_render_frames_stereo_to_multichannel() {
        let dma = SharedDma::new();
        dma.arm(&bytes(&[100, -100, 200, -200]));
        dma.start();

        let mut scratch = vec![0i16; 16];
        let mut out = [1i16; 8];
        render_frames(&dma, &mut scratch, &mut out, 4, |s| s);
        assert_eq!(out, [100, -100, 0, 0, 200, -200, 0, 0]);
    }

    #[test]
    fn test_render_frames_mono_downmix() {
        let dma = SharedDma::new();
        dma.arm(&bytes(&[100, 300]));
        dma.start();

        let mut scratch = vec![0i16; 16];
        let mut out = [0.0f32; 2];
        render_frames(&dma, &mut scratch, &mut out, 1, |s| f32::from(s));
        assert_eq!(out, [200.0, 200.0]);
    }

    #[test]
    fn test_render_frames_in_blocks_larger_than_scratch() {
        let dma = SharedDma::new();
        dma.arm(&bytes(&[1, -1, 2, -2, 3, -3, 4, -4, 5, -5]));
        dma.start();

        // Deux trames par bloc, sept trames demandées sur trois canaux
        let mut scratch = vec![0i16; 4];
        let mut out = [9i16; 21];
        render_frames(&dma, &mut scratch, &mut out, 3, |s| s);
        assert_eq!(scratch.len(), 4);
        assert_eq!(
            out,
            [1, -1, 0, 2, -2, 0, 3, -3, 0, 4, -4, 0, 5, -5, 0, 1, -1, 0, 2, -2, 0]
        );
        assert_eq!(dma.completed(), 1);
    }

    #[test]
    fn test_scratch_frames_from_driver_range() {
        assert_eq!(scratch_frames(&SupportedBufferSize::Unknown), DEFAULT_SCRATCH_FRAMES);
        assert_eq!(
            scratch_frames(&SupportedBufferSize::Range { min: 64, max: 2048 }),
            2048
        );
        assert_eq!(
            scratch_frames(&SupportedBufferSize::Range { min: 0, max: u32::MAX }),
            MAX_SCRATCH_FRAMES
        );
    }
}
