//! Guest runtime error types.

use thiserror::Error;

use crate::client_error::ClientError;

#[derive(Error, Debug)]
pub enum GuestError {
    #[error("decode error: {0}")]
    Codec(#[from] prost::DecodeError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid utf-8 payload: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("client error: {0}")]
    Client(ClientError),

    #[error("buffer of {0} bytes does not fit a 32-bit length")]
    BufferTooLarge(usize),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("semver error: {0}")]
    Semver(#[from] semver::Error),
}

impl From<ClientError> for GuestError {
    fn from(err: ClientError) -> Self {
        Self::Client(err)
    }
}

impl GuestError {
    /// The host classification, when this error came back from a
    /// cross-resource call.
    pub fn client(&self) -> Option<ClientError> {
        match self {
            Self::Client(err) => Some(*err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.client().is_some_and(ClientError::is_not_found)
    }

    pub fn is_already_exists(&self) -> bool {
        self.client().is_some_and(ClientError::is_already_exists)
    }
}
