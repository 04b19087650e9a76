//! Configuration types for sensevox.

use crate::display::palette;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SenseConfig {
    /// Audio capture/playback settings.
    pub audio: AudioConfig,
    /// LED matrix settings.
    pub display: DisplayConfig,
    /// Dialogue loop settings.
    pub dialogue: DialogueConfig,
}

/// Audio I/O configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate for push-to-talk capture in Hz.
    pub capture_sample_rate: u32,
    /// Sample rate of synthesized speech and sound clips in Hz.
    pub speech_sample_rate: u32,
    /// Samples per capture chunk.
    pub chunk_size: usize,
    /// Input device name (None = system default).
    pub input_device: Option<String>,
    /// Output device name (None = system default).
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate: crate::audio::CAPTURE_SAMPLE_RATE,
            speech_sample_rate: crate::audio::SPEECH_SAMPLE_RATE,
            chunk_size: crate::audio::CAPTURE_CHUNK,
            input_device: None,
            output_device: None,
        }
    }
}

/// LED matrix configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Frames drawn per second by the display handler.
    pub refresh_rate_hz: u32,
    /// Palette name used for scrolled reply text.
    pub text_colour: String,
    /// How often the idle progress dial advances, in milliseconds.
    pub dial_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 5,
            text_colour: "white".to_owned(),
            dial_interval_ms: 100,
        }
    }
}

impl DisplayConfig {
    /// Inter-frame interval derived from the refresh rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.refresh_rate_hz.max(1)))
    }

    /// Dial step interval.
    pub fn dial_interval(&self) -> Duration {
        Duration::from_millis(self.dial_interval_ms.max(1))
    }
}

/// Dialogue loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Directory holding the WAV clips played by special-mode phrases.
    pub clip_dir: PathBuf,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            clip_dir: config_dir().join("clips"),
        }
    }
}

fn config_dir() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("sensevox")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config").join("sensevox")
    } else {
        PathBuf::from("/tmp/sensevox-config")
    }
}

impl SenseConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::SenseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SenseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/sensevox/config.toml`.
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Reject values the runtime cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`SenseError::Config`](crate::error::SenseError::Config) naming the bad field.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SenseError;

        if self.audio.capture_sample_rate == 0 {
            return Err(SenseError::Config(
                "audio.capture_sample_rate must be positive".into(),
            ));
        }
        if self.audio.speech_sample_rate == 0 {
            return Err(SenseError::Config(
                "audio.speech_sample_rate must be positive".into(),
            ));
        }
        if self.audio.chunk_size == 0 {
            return Err(SenseError::Config("audio.chunk_size must be positive".into()));
        }
        if self.display.refresh_rate_hz == 0 {
            return Err(SenseError::Config(
                "display.refresh_rate_hz must be positive".into(),
            ));
        }
        if palette::named(&self.display.text_colour).is_none() {
            return Err(SenseError::Config(format!(
                "display.text_colour '{}' is not a known colour",
                self.display.text_colour
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SenseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.capture_sample_rate, 44_100);
        assert_eq!(config.audio.speech_sample_rate, 24_000);
        assert_eq!(config.audio.chunk_size, 4096);
        assert_eq!(config.display.frame_interval(), Duration::from_millis(200));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SenseConfig::default();
        config.audio.capture_sample_rate = 16_000;
        config.display.text_colour = "violet".to_owned();
        config.audio.input_device = Some("USB Mic".to_owned());

        config.save_to_file(&path).unwrap();
        assert!(path.exists());

        let loaded = SenseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.audio.capture_sample_rate, 16_000);
        assert_eq!(loaded.display.text_colour, "violet");
        assert_eq!(loaded.audio.input_device.as_deref(), Some("USB Mic"));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[display]\nrefresh_rate_hz = 1\n").unwrap();

        let loaded = SenseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.display.refresh_rate_hz, 1);
        assert_eq!(loaded.display.text_colour, "white");
        assert_eq!(loaded.audio.speech_sample_rate, 24_000);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = SenseConfig::from_file(std::path::Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(SenseConfig::from_file(&path).is_err());
    }

    #[test]
    fn unknown_text_colour_is_rejected() {
        let mut config = SenseConfig::default();
        config.display.text_colour = "octarine".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("octarine"));
    }

    #[test]
    fn zero_refresh_rate_is_rejected() {
        let mut config = SenseConfig::default();
        config.display.refresh_rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = SenseConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("sensevox"));
    }
}
