use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provided presentation path is invalid: {0}")]
    InvalidPath(PathBuf),

    #[error("Provided document is not a Beamer presentation")]
    NotBeamer,

    #[error("Frame structure error: {0}")]
    FrameCountMismatch(String),

    #[error("Missing `{0}` in document")]
    MissingToken(&'static str),

    #[error("Token cannot be an empty value")]
    EmptyToken,

    #[error("Unclosed list detected")]
    UnclosedList,
}

/// Errors raised while loading [`crate::BeautifierConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Invalid(String),
}
