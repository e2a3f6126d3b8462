use std::path::PathBuf;

/// Failure to read or parse an `.apiconfig` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure to load or persist a problem filter store.
#[derive(Debug, thiserror::Error)]
pub enum FilterStoreError {
    #[error("cannot access filter store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed filter store: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the analyzer entry points.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filters(#[from] FilterStoreError),

    /// The current baseline has no component with this id.
    #[error("component not found: {0}")]
    UnknownComponent(String),
}
