//! Registration authority error types.

use thiserror::Error;

/// Result type for RA operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classes, stable across collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Trust material could not be loaded at construction.
    CaInitFail,
    /// A signed certificate could not be produced.
    CertGen,
    /// The CSR was rejected by pre-sign validation.
    Csr,
    /// The requested TTL was rejected by pre-sign validation.
    Ttl,
    /// The RA configuration is invalid.
    IllegalConfig,
    /// PEM or X.509 material could not be parsed.
    Parse,
}

/// RA error variants.
///
/// Every variant carries a message only. Failures from external collaborators
/// are flattened into their message so the variant set stays the same no
/// matter which collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Root trust material could not be loaded or parsed.
    #[error("CA initialization failed: {0}")]
    CaInitFail(String),

    /// Certificate generation failed after construction.
    #[error("certificate generation failed: {0}")]
    CertGen(String),

    /// CSR validation failed.
    #[error("CSR validation failed: {0}")]
    Csr(String),

    /// Requested TTL is not allowed.
    #[error("TTL validation failed: {0}")]
    Ttl(String),

    /// Configuration is invalid.
    #[error("illegal RA configuration: {0}")]
    IllegalConfig(String),

    /// PEM or certificate parsing failed.
    #[error("certificate parsing failed: {0}")]
    Parse(String),
}

impl Error {
    /// Returns the class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CaInitFail(_) => ErrorKind::CaInitFail,
            Self::CertGen(_) => ErrorKind::CertGen,
            Self::Csr(_) => ErrorKind::Csr,
            Self::Ttl(_) => ErrorKind::Ttl,
            Self::IllegalConfig(_) => ErrorKind::IllegalConfig,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}
