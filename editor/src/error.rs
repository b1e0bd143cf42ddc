use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("page not found: {0}")]
    NotFound(String),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("template error: {0}")]
    Template(#[from] mustache::Error),

    #[error("no `secret` configured; anti-forgery tokens need a signing secret")]
    MissingSecret,

    #[error("sync failed: {0}")]
    Sync(String),
}
