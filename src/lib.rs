//! GX Audio Sync - Synchronisation audio par DMA pour émulateur Genesis
//!
//! Cette bibliothèque convertit les échantillons produits à chaque trame
//! émulée en un flux continu de transferts DMA, tout en utilisant la fin
//! des transferts comme horloge de cadencement de la boucle d'émulation.

pub mod audio;
pub mod timing;
pub mod config;

pub use audio::*;
pub use timing::*;
pub use config::*;

/// Version de la bibliothèque
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fréquence d'échantillonnage de sortie en Hz
pub const SAMPLE_RATE: u32 = 48_000;

/// Taille d'une trame d'échantillon stéréo 16 bits en octets
pub const BYTES_PER_SAMPLE: usize = 4;

/// Alignement exigé par le moteur DMA
pub const DMA_ALIGNMENT: usize = 32;

/// Trame 50Hz : période de 20000 us, soit 960 échantillons à 48kHz
pub const PAL_FRAME_SAMPLES: usize = 960;

/// Trame 60Hz : période de 16667 us, soit 800 échantillons à 48kHz
pub const NTSC_FRAME_SAMPLES: usize = 800;

/// Longueur alternative utilisée pour rattraper la période VSYNC réelle
pub const NTSC_ALT_FRAME_SAMPLES: usize = 808;

/// Échantillons attendus par période VSYNC 60Hz (16715 us), x100
pub const NTSC_DRIFT_SYNC: i64 = 80_232;

/// Taille d'un tampon DMA (une trame 50Hz complète)
pub const SOUND_BUFFER_SIZE: usize = PAL_FRAME_SAMPLES * BYTES_PER_SAMPLE; // 3840 octets
