//! Erreurs des backends audio hébergés

use std::path::PathBuf;
use thiserror::Error;

/// Erreurs pouvant survenir lors de l'ouverture d'un backend audio
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Aucun périphérique audio disponible")]
    NoOutputDevice,

    #[error("Format d'échantillon non supporté: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration par défaut indisponible: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Impossible de créer le flux audio: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Impossible de lancer le flux audio: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Impossible de lancer le thread DMA: {0}")]
    Thread(#[source] std::io::Error),

    #[error("Impossible de charger la musique de fond {path}: {source}")]
    Music {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Résultat des opérations audio
pub type AudioResult<T> = std::result::Result<T, AudioError>;
