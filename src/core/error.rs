use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Determinism violation at tick {tick}: {detail}")]
    Nondeterministic { tick: crate::core::types::Tick, detail: String },
}

pub type Result<T> = std::result::Result<T, AiError>;
