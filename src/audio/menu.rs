//! Audio du menu : musique de fond chargée en mémoire
//!
//! Le décodage et la lecture de la piste sont assurés par le front-end ;
//! cette structure garde la piste et l'état de lecture demandé.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::error::{AudioError, AudioResult};
use super::traits::MenuAudio;

/// Nom de fichier de la musique de fond
pub const BACKGROUND_MUSIC_FILE: &str = "Bg_music.ogg";

/// État de lecture de la musique de fond
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Stopped,
    Paused,
    Playing,
}

/// Musique de fond du menu
#[derive(Debug)]
pub struct BackgroundMusic {
    /// Contenu du fichier ogg
    track: Option<Vec<u8>>,
    source: Option<PathBuf>,
    state: MenuState,

    /// Mixeur du menu initialisé et non mis en pause
    mixer_active: bool,

    /// Dernier volume appliqué (0-255)
    volume: u8,
}

impl BackgroundMusic {
    /// Menu sans musique de fond
    pub fn new() -> Self {
        Self {
            track: None,
            source: None,
            state: MenuState::Stopped,
            mixer_active: true,
            volume: 0,
        }
    }

    pub fn from_bytes(track: Vec<u8>) -> Self {
        Self {
            track: Some(track),
            ..Self::new()
        }
    }

    /// Charge la piste depuis un fichier
    pub fn load(path: impl AsRef<Path>) -> AudioResult<Self> {
        let path = path.as_ref();
        let track = fs::read(path).map_err(|source| AudioError::Music {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Musique de fond chargée: {} ({} octets)", path.display(), track.len());
        Ok(Self {
            track: Some(track),
            source: Some(path.to_path_buf()),
            ..Self::new()
        })
    }

    /// Cherche `Bg_music.ogg` dans le répertoire donné ; un fichier absent
    /// donne un menu silencieux.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> AudioResult<Self> {
        let path = dir.as_ref().join(BACKGROUND_MUSIC_FILE);
        if path.is_file() {
            Self::load(path)
        } else {
            debug!("Pas de musique de fond dans {}", dir.as_ref().display());
            Ok(Self::new())
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_mixer_active(&self) -> bool {
        self.mixer_active
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn track(&self) -> Option<&[u8]> {
        self.track.as_deref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Default for BackgroundMusic {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuAudio for BackgroundMusic {
    fn pause_music(&mut self, paused: bool) {
        self.state = match (self.state, paused) {
            (MenuState::Playing, true) => MenuState::Paused,
            (MenuState::Paused, false) => MenuState::Playing,
            (state, _) => state,
        };
    }

    fn stop_music(&mut self) {
        self.state = MenuState::Stopped;
    }

    fn shutdown(&mut self) {
        self.mixer_active = false;
        debug!("Audio du menu coupé");
    }

    fn init(&mut self) {
        self.mixer_active = true;
        debug!("Audio du menu relancé");
    }

    fn has_music(&self) -> bool {
        self.track.is_some()
    }

    fn play_music(&mut self, volume: u8) {
        if self.track.is_none() {
            return;
        }
        self.volume = volume;
        self.state = MenuState::Playing;
        debug!("Musique de fond en lecture, volume {}", volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_silent_menu_ignores_play() {
        let mut menu = BackgroundMusic::new();
        assert!(!menu.has_music());
        menu.play_music(255);
        assert_eq!(menu.state(), MenuState::Stopped);
    }

    #[test]
    fn test_pause_resume() {
        let mut menu = BackgroundMusic::from_bytes(vec![1, 2, 3]);
        menu.play_music(128);
        assert_eq!(menu.state(), MenuState::Playing);

        menu.pause_music(true);
        assert_eq!(menu.state(), MenuState::Paused);
        menu.pause_music(false);
        assert_eq!(menu.state(), MenuState::Playing);

        menu.stop_music();
        menu.pause_music(false);
        assert_eq!(menu.state(), MenuState::Stopped);
    }

    #[test]
    fn test_load_from_dir() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;

        let menu = BackgroundMusic::load_from_dir(temp_dir.path())?;
        assert!(!menu.has_music());

        let path = temp_dir.path().join(BACKGROUND_MUSIC_FILE);
        fs::write(&path, b"OggS")?;

        let menu = BackgroundMusic::load_from_dir(temp_dir.path())?;
        assert_eq!(menu.track(), Some(&b"OggS"[..]));
        assert_eq!(menu.source(), Some(path.as_path()));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = BackgroundMusic::load("/nonexistent/Bg_music.ogg").unwrap_err();
        assert!(matches!(err, AudioError::Music { .. }));
    }
}
