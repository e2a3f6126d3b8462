/// Errors raised while building descriptors, versions or baselines.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A version string does not follow `major[.minor[.micro[.qualifier]]]`.
    #[error("invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// A version range is not a bare version or an interval such as `[1.0.0,2.0.0)`.
    #[error("invalid version range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    /// The snapshot does not have the expected shape.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The snapshot JSON could not be decoded.
    #[error("snapshot decoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
