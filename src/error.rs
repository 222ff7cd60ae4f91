use std::io;
use std::path::PathBuf;

/// Failures while finding, opening or validating the touch device.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list input devices in {dir}: {source}")]
    Enumerate {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{device} is not a multitouch device")]
    NotMultitouch { device: String },

    #[error("{device} reports no multitouch slots (type A device)")]
    NoSlots { device: String },

    #[error("no touchpad found")]
    NotFound,

    #[error("multitouch backend unavailable: {0}")]
    Backend(String),
}

/// Failures after streaming started. All of them end the run loop.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("device read failed: {0}")]
    Read(#[source] io::Error),

    #[error("failed to deliver message: {0}")]
    Deliver(#[source] io::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("frame envelope alone is {size} bytes, limit is {limit}")]
    Oversized { size: usize, limit: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
