//! Tampons DMA double buffering
//!
//! Un tampon est actif (lu par le DMA), l'autre est le tampon de travail
//! (rempli pendant l'émulation de la trame). Le logiciel n'écrit jamais dans
//! le tampon actif.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{DMA_ALIGNMENT, SOUND_BUFFER_SIZE};

/// Tampon DMA aligné sur 32 octets
#[derive(Clone)]
#[repr(C, align(32))]
pub struct DmaBuffer {
    data: [u8; SOUND_BUFFER_SIZE],
}

const _: () = assert!(std::mem::align_of::<DmaBuffer>() == DMA_ALIGNMENT);
const _: () = assert!(SOUND_BUFFER_SIZE % DMA_ALIGNMENT == 0);

impl DmaBuffer {
    pub fn new() -> Self {
        Self {
            data: [0; SOUND_BUFFER_SIZE],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Vue en échantillons 16 bits entrelacés
    pub fn samples_mut(&mut self) -> &mut [i16] {
        bytemuck::cast_slice_mut(&mut self.data[..])
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Adresse du tampon, utilisée pour identifier les transferts
    pub fn address(&self) -> usize {
        self.data.as_ptr() as usize
    }
}

impl Default for DmaBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DmaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmaBuffer")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("size", &SOUND_BUFFER_SIZE)
            .finish()
    }
}

/// Paire de tampons avec curseur de travail atomique
#[derive(Debug)]
pub struct DoubleBuffer {
    buffers: Box<[DmaBuffer; 2]>,

    /// Index du tampon de travail
    work: AtomicUsize,
}

impl DoubleBuffer {
    pub fn new() -> Self {
        Self {
            buffers: Box::new([DmaBuffer::new(), DmaBuffer::new()]),
            work: AtomicUsize::new(0),
        }
    }

    /// Index du tampon de travail
    pub fn work_index(&self) -> usize {
        self.work.load(Ordering::Acquire)
    }

    /// Tampon de travail, seul tampon modifiable par le logiciel
    pub fn work_mut(&mut self) -> &mut DmaBuffer {
        let index = self.work_index();
        &mut self.buffers[index]
    }

    /// Échange les rôles et retourne l'index du tampon qui vient d'être rempli
    pub fn swap(&self) -> usize {
        self.work.fetch_xor(1, Ordering::AcqRel)
    }

    pub fn buffer(&self, index: usize) -> &DmaBuffer {
        &self.buffers[index & 1]
    }

    /// Remet les deux tampons à zéro
    pub fn clear(&mut self) {
        for buffer in self.buffers.iter_mut() {
            buffer.clear();
        }
    }

    /// Efface les tampons et replace le curseur sur le premier
    pub fn reset(&mut self) {
        self.clear();
        self.work.store(0, Ordering::Release);
    }
}

impl Default for DoubleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
