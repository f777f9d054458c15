use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    /// Required parameters or credentials were not supplied. Raised before any fetch.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// The remote sheet or local file could not be reached or read.
    #[error("Source access failed: {0}")]
    SourceAccess(String),

    /// A cleaning stage failed. No partial table is returned alongside it.
    #[error("Pipeline failed: {0}")]
    Pipeline(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CleanerError>;
