use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::Level;

use crate::error::ConfigError;
use crate::event_dispatcher::{NATIVE_MESSAGE_LIMIT, OutputMode};
use crate::input_devices::discovery::DEFAULT_INPUT_DIR;
use crate::input_devices::selector::{DEFAULT_PRIORITY_PATTERNS, PriorityPatterns};

/// Smallest accepted `max_message_bytes`. Below this even a frame with no
/// fingers may not fit and every frame would fail to encode.
pub const MIN_MESSAGE_BYTES: usize = 256;

/// Runtime configuration, read from an optional TOML file.
///
/// ```toml
/// # skip discovery and use this node
/// device = "/dev/input/event9"
/// priority_patterns = ["touchpad", "elan"]
/// output = "framed"
/// max_message_bytes = 1048576
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub device: Option<PathBuf>,
    pub input_dir: PathBuf,
    pub priority_patterns: Vec<String>,
    pub output: OutputMode,
    pub max_message_bytes: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            priority_patterns: DEFAULT_PRIORITY_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            output: OutputMode::Auto,
            max_message_bytes: NATIVE_MESSAGE_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priority_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "priority_patterns",
                reason: "patterns must not be empty".into(),
            });
        }
        if self.max_message_bytes < MIN_MESSAGE_BYTES {
            return Err(ConfigError::Invalid {
                field: "max_message_bytes",
                reason: format!("must be at least {MIN_MESSAGE_BYTES}"),
            });
        }
        if u32::try_from(self.max_message_bytes).is_err() {
            return Err(ConfigError::Invalid {
                field: "max_message_bytes",
                reason: "must fit a 32-bit length prefix".into(),
            });
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse::<Level>()
            .map_err(|e| ConfigError::Invalid {
                field: "log_level",
                reason: e.to_string(),
            })
    }

    pub fn patterns(&self) -> PriorityPatterns {
        PriorityPatterns::new(&self.priority_patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.input_dir, PathBuf::from("/dev/input"));
        assert_eq!(config.level().unwrap(), Level::INFO);
        assert!(config.patterns().matches(Some("SynPS/2 Synaptics TouchPad")));
    }

    #[test]
    fn parses_every_field() {
        let config = Config::from_toml_str(
            r#"
            device = "/dev/input/event9"
            input_dir = "/tmp/input"
            priority_patterns = ["magic"]
            output = "text"
            max_message_bytes = 4096
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.device, Some(PathBuf::from("/dev/input/event9")));
        assert_eq!(config.input_dir, PathBuf::from("/tmp/input"));
        assert_eq!(config.output, OutputMode::Text);
        assert_eq!(config.max_message_bytes, 4096);
        assert_eq!(config.level().unwrap(), Level::DEBUG);
        assert!(config.patterns().matches(Some("Apple Magic Pad")));
        assert!(!config.patterns().matches(Some("ELAN Touchpad")));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            Config::from_toml_str("grab = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_bad_values() {
        for text in [
            "max_message_bytes = 0",
            "max_message_bytes = 30",
            "priority_patterns = [\"touchpad\", \"  \"]",
            "log_level = \"loud\"",
        ] {
            assert!(
                matches!(Config::from_toml_str(text), Err(ConfigError::Invalid { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn smallest_limit_still_fits_an_empty_frame() {
        use crate::event_dispatcher::{EvdevContact, Frame, MessageEncoder};

        let config = Config::from_toml_str("max_message_bytes = 256").unwrap();
        let empty = Frame::<EvdevContact> {
            frame: u64::MAX,
            timestamp: f64::MAX,
            fingers: Vec::new(),
        };
        let encoded = MessageEncoder::with_limit(config.max_message_bytes)
            .encode(&empty)
            .unwrap();
        assert!(encoded.body.len() <= MIN_MESSAGE_BYTES);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trackpadd.toml");
        fs::write(&path, "output = \"framed\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output, OutputMode::Framed);

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
