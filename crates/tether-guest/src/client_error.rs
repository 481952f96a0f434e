//! Status codes returned by cross-resource host calls.
//!
//! The host squeezes the outcome of a failed `get`/`create`/`update`/`delete`
//! into a small integer. Codes `1..=20` name a specific API failure; `0` and
//! anything above `20` classify as [`ClientError::Unknown`]. A zero code is
//! *not* success on the packed-pointer channel, see [`crate::packing`].

use thiserror::Error;

/// Highest status code the host assigns a meaning to.
pub const MAX_CLIENT_ERROR_CODE: u32 = 20;

/// Classification of a failed cross-resource operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientError {
    #[error("Unknown")]
    Unknown = 0,
    #[error("NotFound")]
    NotFound = 1,
    #[error("AlreadyExists")]
    AlreadyExists = 2,
    #[error("Invalid")]
    Invalid = 3,
    #[error("Forbidden")]
    Forbidden = 4,
    #[error("Conflict")]
    Conflict = 5,
    #[error("BadRequest")]
    BadRequest = 6,
    #[error("Gone")]
    Gone = 7,
    #[error("InternalError")]
    InternalError = 8,
    #[error("MethodNotSupported")]
    MethodNotSupported = 9,
    #[error("NotAcceptable")]
    NotAcceptable = 10,
    #[error("EntityTooLarge")]
    EntityTooLarge = 11,
    #[error("ResourceExpired")]
    ResourceExpired = 12,
    #[error("ServerTimeout")]
    ServerTimeout = 13,
    #[error("ServiceUnavailable")]
    ServiceUnavailable = 14,
    #[error("Timeout")]
    Timeout = 15,
    #[error("TooManyRequests")]
    TooManyRequests = 16,
    #[error("Unauthorized")]
    Unauthorized = 17,
    #[error("UnexpectedObject")]
    UnexpectedObject = 18,
    #[error("UnexpectedServerError")]
    UnexpectedServerError = 19,
    #[error("UnsupportedMediaType")]
    UnsupportedMediaType = 20,
}

impl ClientError {
    /// Every classification, indexed by its code.
    pub const ALL: [ClientError; 21] = [
        Self::Unknown,
        Self::NotFound,
        Self::AlreadyExists,
        Self::Invalid,
        Self::Forbidden,
        Self::Conflict,
        Self::BadRequest,
        Self::Gone,
        Self::InternalError,
        Self::MethodNotSupported,
        Self::NotAcceptable,
        Self::EntityTooLarge,
        Self::ResourceExpired,
        Self::ServerTimeout,
        Self::ServiceUnavailable,
        Self::Timeout,
        Self::TooManyRequests,
        Self::Unauthorized,
        Self::UnexpectedObject,
        Self::UnexpectedServerError,
        Self::UnsupportedMediaType,
    ];

    /// Classify a raw host status code. Out-of-range codes are `Unknown`.
    pub fn from_code(code: u32) -> Self {
        if code > MAX_CLIENT_ERROR_CODE {
            return Self::Unknown;
        }
        Self::ALL[code as usize]
    }

    /// The wire code of this classification.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable name, identical to the `Display` output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::Invalid => "Invalid",
            Self::Forbidden => "Forbidden",
            Self::Conflict => "Conflict",
            Self::BadRequest => "BadRequest",
            Self::Gone => "Gone",
            Self::InternalError => "InternalError",
            Self::MethodNotSupported => "MethodNotSupported",
            Self::NotAcceptable => "NotAcceptable",
            Self::EntityTooLarge => "EntityTooLarge",
            Self::ResourceExpired => "ResourceExpired",
            Self::ServerTimeout => "ServerTimeout",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::Timeout => "Timeout",
            Self::TooManyRequests => "TooManyRequests",
            Self::Unauthorized => "Unauthorized",
            Self::UnexpectedObject => "UnexpectedObject",
            Self::UnexpectedServerError => "UnexpectedServerError",
            Self::UnsupportedMediaType => "UnsupportedMediaType",
        }
    }

    // ── Predicates ──────────────────────────────────────────────────

    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }

    pub fn is_not_found(self) -> bool {
        self == Self::NotFound
    }

    pub fn is_already_exists(self) -> bool {
        self == Self::AlreadyExists
    }

    pub fn is_invalid(self) -> bool {
        self == Self::Invalid
    }

    pub fn is_forbidden(self) -> bool {
        self == Self::Forbidden
    }

    pub fn is_conflict(self) -> bool {
        self == Self::Conflict
    }

    pub fn is_bad_request(self) -> bool {
        self == Self::BadRequest
    }

    pub fn is_gone(self) -> bool {
        self == Self::Gone
    }

    pub fn is_internal_error(self) -> bool {
        self == Self::InternalError
    }

    pub fn is_method_not_supported(self) -> bool {
        self == Self::MethodNotSupported
    }

    pub fn is_not_acceptable(self) -> bool {
        self == Self::NotAcceptable
    }

    pub fn is_entity_too_large(self) -> bool {
        self == Self::EntityTooLarge
    }

    pub fn is_resource_expired(self) -> bool {
        self == Self::ResourceExpired
    }

    pub fn is_server_timeout(self) -> bool {
        self == Self::ServerTimeout
    }

    pub fn is_service_unavailable(self) -> bool {
        self == Self::ServiceUnavailable
    }

    pub fn is_timeout(self) -> bool {
        self == Self::Timeout
    }

    pub fn is_too_many_requests(self) -> bool {
        self == Self::TooManyRequests
    }

    pub fn is_unauthorized(self) -> bool {
        self == Self::Unauthorized
    }

    pub fn is_unexpected_object(self) -> bool {
        self == Self::UnexpectedObject
    }

    pub fn is_unexpected_server_error(self) -> bool {
        self == Self::UnexpectedServerError
    }

    pub fn is_unsupported_media_type(self) -> bool {
        self == Self::UnsupportedMediaType
    }
}

impl From<u32> for ClientError {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}
