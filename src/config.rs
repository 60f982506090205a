use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "WELCOMEBOT";
const DEFAULT_CONFIG_FILE: &str = "welcomebot.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub log_level: String,
    pub frame_buffer_size: usize,
    pub result_buffer_size: usize,
    pub upload: UploadSettings,
    pub identity: IdentitySettings,
    pub classifier: ClassifierSettings,
    pub announce: AnnounceSettings,
    pub capture: CaptureSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            // Late frames are dropped, not queued.
            frame_buffer_size: 1,
            result_buffer_size: 16,
            upload: UploadSettings::default(),
            identity: IdentitySettings::default(),
            classifier: ClassifierSettings::default(),
            announce: AnnounceSettings::default(),
            capture: CaptureSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub endpoint: String,
    pub cooldown_secs: f64,
    pub timeout_secs: f64,
    /// JPEG quality, 1 (smallest payload) to 100.
    pub jpeg_quality: u8,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/".to_string(),
            cooldown_secs: 3.0,
            timeout_secs: 10.0,
            jpeg_quality: 1,
        }
    }
}

impl UploadSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMatching {
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub delimiter: char,
    pub matching: IdentityMatching,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            delimiter: '-',
            matching: IdentityMatching::CaseInsensitive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Motion,
    #[default]
    AcceptAll,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub kind: ClassifierKind,
    pub change_threshold: usize,
    pub history_window: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::AcceptAll,
            change_threshold: 5,
            history_window: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnounceSettings {
    /// Greeting templates; `{name}` is replaced with the subject's display name.
    pub templates: Vec<String>,
    pub display_clear_secs: f64,
    /// Text-to-speech program and its leading arguments. The greeting is
    /// appended as the last argument.
    pub speech_command: Option<Vec<String>>,
}

impl Default for AnnounceSettings {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            display_clear_secs: 10.0,
            speech_command: None,
        }
    }
}

impl AnnounceSettings {
    pub fn display_clear_delay(&self) -> Duration {
        Duration::from_secs_f64(self.display_clear_secs)
    }
}

fn default_templates() -> Vec<String> {
    [
        "Welcome {name}!",
        "{name} has entered the building",
        "{name} is in the house",
        "Warning: {name} is approaching",
        "Quick, hide and look busy, {name} is here!",
        "Oh no, who let {name} in?",
        "Please join me in welcoming {name}",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    LeftMirrored,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub directory: Option<PathBuf>,
    pub fps: u32,
    pub orientation: Orientation,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            directory: None,
            fps: 15,
            orientation: Orientation::Up,
        }
    }
}

impl Configuration {
    /// Loads configuration from `path` (or `welcomebot.toml` when absent; the
    /// file is optional) overlaid with `WELCOMEBOT__SECTION__KEY` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let configuration: Configuration = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.frame_buffer_size == 0 {
            return Err(AppError::Config(
                "Frame buffer size must be greater than 0".to_string(),
            ));
        }

        if self.result_buffer_size == 0 {
            return Err(AppError::Config(
                "Result buffer size must be greater than 0".to_string(),
            ));
        }

        if self.upload.endpoint.trim().is_empty() {
            return Err(AppError::Config("Upload endpoint must be set".to_string()));
        }

        if !(self.upload.cooldown_secs.is_finite() && self.upload.cooldown_secs > 0.0) {
            return Err(AppError::Config(
                "Upload cooldown must be greater than 0".to_string(),
            ));
        }

        if !(self.upload.timeout_secs.is_finite() && self.upload.timeout_secs > 0.0) {
            return Err(AppError::Config(
                "Upload timeout must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.upload.jpeg_quality) {
            return Err(AppError::Config(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.classifier.history_window == 0 {
            return Err(AppError::Config(
                "Classifier history window must be greater than 0".to_string(),
            ));
        }

        if self.announce.templates.is_empty() {
            return Err(AppError::Config(
                "At least one greeting template is required".to_string(),
            ));
        }

        if !(self.announce.display_clear_secs.is_finite() && self.announce.display_clear_secs > 0.0)
        {
            return Err(AppError::Config(
                "Display clear delay must be greater than 0".to_string(),
            ));
        }

        if matches!(&self.announce.speech_command, Some(command) if command.is_empty()) {
            return Err(AppError::Config(
                "Speech command must name a program".to_string(),
            ));
        }

        if self.capture.fps == 0 {
            return Err(AppError::Config(
                "Capture frame rate must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Loading reads process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_temp_toml(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("welcomebot-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn default_configuration_is_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.upload.cooldown(), Duration::from_secs(3));
        assert_eq!(configuration.announce.templates.len(), 7);
    }

    #[test]
    fn rejects_zero_cooldown() {
        let mut configuration = Configuration::default();
        configuration.upload.cooldown_secs = 0.0;
        assert!(matches!(configuration.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let mut configuration = Configuration::default();
        configuration.upload.jpeg_quality = 0;
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn rejects_empty_templates() {
        let mut configuration = Configuration::default();
        configuration.announce.templates.clear();
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn loads_sections_from_toml_file() {
        let _env = env_lock();
        let path = write_temp_toml(
            r#"
log_level = "debug"

[upload]
endpoint = "http://example.invalid/identify"
cooldown_secs = 5

[identity]
matching = "case_sensitive"

[capture]
orientation = "left_mirrored"
"#,
        );

        let configuration = Configuration::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(configuration.log_level, "debug");
        assert_eq!(configuration.upload.endpoint, "http://example.invalid/identify");
        assert_eq!(configuration.upload.cooldown(), Duration::from_secs(5));
        assert_eq!(configuration.identity.matching, IdentityMatching::CaseSensitive);
        assert_eq!(configuration.capture.orientation, Orientation::LeftMirrored);
        assert_eq!(configuration.upload.jpeg_quality, 1);
    }

    #[test]
    fn environment_overrides_file_values() {
        let _env = env_lock();
        let path = write_temp_toml(
            r#"
[upload]
cooldown_secs = 5
"#,
        );
        let overrides = [
            ("WELCOMEBOT__UPLOAD__COOLDOWN_SECS", "7"),
            ("WELCOMEBOT__CAPTURE__FPS", "40"),
            ("WELCOMEBOT__IDENTITY__DELIMITER", "_"),
            ("WELCOMEBOT__LOG_LEVEL", "debug"),
        ];
        for (key, value) in overrides {
            std::env::set_var(key, value);
        }

        let loaded = Configuration::load(Some(&path));
        for (key, _) in overrides {
            std::env::remove_var(key);
        }
        std::fs::remove_file(&path).unwrap();

        let configuration = loaded.unwrap();
        assert_eq!(configuration.upload.cooldown(), Duration::from_secs(7));
        assert_eq!(configuration.capture.fps, 40);
        assert_eq!(configuration.identity.delimiter, '_');
        assert_eq!(configuration.log_level, "debug");
    }
}
