//! Configuration de l'audio et du cadencement

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::timing::{Region, VideoTiming};
use crate::SAMPLE_RATE;

/// Configuration principale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub audio: AudioConfig,
    pub video: VideoConfig,
    pub emulation: EmulationConfig,
}

/// Backend de sortie audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    /// Périphérique de sortie par défaut
    Cpal,
    /// Minuteur sans sortie sonore
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    pub backend: AudioBackend,
    /// Volume de la musique du menu (0-100)
    pub bgm_volume: u8,
    /// Répertoire contenant Bg_music.ogg
    pub bgm_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Région de la sortie vidéo de la console
    pub display_region: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    /// Région du VDP émulé
    pub emulated_region: Region,
    /// Nombre de trames à émuler (0 = illimité)
    pub frames: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: SAMPLE_RATE,
            backend: AudioBackend::Cpal,
            bgm_volume: 100,
            bgm_path: None,
        }
    }
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            emulated_region: Region::Ntsc,
            frames: 600,
        }
    }
}

impl EmulatorConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: EmulatorConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn load_or_default(path: &str) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    /// Vérifie la cohérence des valeurs
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate != SAMPLE_RATE {
            return Err(anyhow!(
                "Fréquence d'échantillonnage non supportée: {} (seule {} est gérée)",
                self.audio.sample_rate,
                SAMPLE_RATE
            ));
        }
        if self.audio.bgm_volume > 100 {
            return Err(anyhow!("Volume de musique hors limites: {}", self.audio.bgm_volume));
        }
        Ok(())
    }

    /// Timing vidéo de la session
    pub fn video_timing(&self) -> VideoTiming {
        VideoTiming::new(self.emulation.emulated_region, self.video.display_region)
    }
}
