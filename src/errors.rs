//! Error types you might see while acquiring a container image source

use thiserror::Error;

/// Errors during source acquisition
///
/// Every stage of [crate::ConveyorPacker::get] reports failures through this
/// type, and they reach the caller unmodified. Nothing here is retried
/// internally.
#[derive(Error, Debug)]
pub enum SourceError {
    /// invalid image reference format
    #[error("invalid image reference format: {0:?}")]
    InvalidReference(String),

    /// only the default registry can be queried for manifests
    #[error("registry is not supported, only the default registry can be queried: {0:?}")]
    UnsupportedRegistry(String),

    /// registry endpoint is not a usable base url
    #[error("registry endpoint is not a usable base url: {0:?}")]
    InvalidEndpoint(String),

    /// network request error
    #[error("network request error: {0}")]
    Network(#[from] reqwest::Error),

    /// network request timed out
    #[error("network request timed out")]
    Timeout,

    /// registry server responded with a non-success status
    #[error("registry server responded with {0}")]
    RegistryStatus(String),

    /// manifest from the registry could not be decoded
    #[error("manifest from the registry could not be decoded: {0}")]
    ManifestDecode(#[from] serde_json::Error),

    /// downloaded image size does not match the size the server declared
    #[error("image received is not the right size, expected {expected} bytes, received {actual}")]
    Integrity { expected: u64, actual: u64 },

    /// workspace or temp file io error
    #[error("workspace io error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// recipe header has no `from` field
    #[error("recipe header has no `from` field")]
    MissingFrom,

    /// no source backend is registered for this reference scheme
    #[error("no source backend is registered for {0:?}")]
    UnknownSource(String),

    /// pack requested before a successful get
    #[error("pack requested before an image was acquired")]
    NotAcquired,

    /// error reported by a packer collaborator
    #[error("packer error: {0}")]
    Packer(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    /// Classify a reqwest error, separating out timeouts
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::Network(err)
        }
    }
}
