//! Error types for chain validation
//!
//! All failures surface as a single [`TrustLinkError`] carrying a
//! machine-readable [`TrustReason`], a human-readable message and an optional
//! underlying cause.

use std::fmt;
use thiserror::Error;

/// Result type alias for trust validation operations
pub type Result<T> = std::result::Result<T, TrustLinkError>;

/// Machine-readable reason attached to a failed trust validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustReason {
    /// Signature verification failed, or child/issuer names do not line up
    InvalidSignature,

    /// Validation date outside a certificate's notBefore/notAfter interval
    InvalidValidityInterval,

    /// Certificate reported revoked (or unknown) by OCSP or CRL
    InvalidRevocationStatus,

    /// OCSP responder could not be reached
    OcspUnavailable,

    /// No trust linker could positively establish trust
    NoTrust,

    /// Top of the chain is not a trust anchor
    RootNotTrusted,

    /// Algorithm policy, BasicConstraints, KeyUsage or EKU violation
    ConstraintViolation,
}

impl fmt::Display for TrustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrustReason::InvalidSignature => "invalid signature",
            TrustReason::InvalidValidityInterval => "invalid validity interval",
            TrustReason::InvalidRevocationStatus => "invalid revocation status",
            TrustReason::OcspUnavailable => "OCSP responder unavailable",
            TrustReason::NoTrust => "no trust",
            TrustReason::RootNotTrusted => "root not trusted",
            TrustReason::ConstraintViolation => "constraint violation",
        };
        f.write_str(name)
    }
}

/// Error raised when a certificate chain fails validation
#[derive(Debug, Error)]
#[error("{reason}: {message}")]
pub struct TrustLinkError {
    /// Why validation failed
    pub reason: TrustReason,

    /// Human-readable description of the failure
    pub message: String,

    /// Underlying cause, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TrustLinkError {
    /// Create a new error with the given reason and message
    pub fn new(reason: TrustReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error wrapping an underlying cause
    pub fn with_source(
        reason: TrustReason,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            reason,
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
