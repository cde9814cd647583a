//! Collaborator repositories
//!
//! The validator core performs no I/O of its own. Trust anchors come from a
//! [`CertificateRepository`]; OCSP responses and CRLs are supplied by async
//! repositories the linkers call at well-defined suspension points, so a
//! caller can cancel a validation while a fetch is in flight without leaving
//! the revocation evidence half-written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Raised by an [`OcspRepository`] when the responder cannot be reached
#[derive(Debug, Error)]
#[error("OCSP responder not available: {0}")]
pub struct ServerNotAvailable(pub String);

/// Holds the trust anchors
pub trait CertificateRepository: Send + Sync {
    /// Whether the DER-encoded certificate is a trust point.
    ///
    /// Membership is decided by encoded-bytes equality.
    fn is_trust_point(&self, certificate: &[u8]) -> bool;
}

/// In-memory trust anchor set
#[derive(Debug, Default, Clone)]
pub struct MemoryCertificateRepository {
    trust_points: HashSet<Vec<u8>>,
}

impl MemoryCertificateRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a DER-encoded certificate as a trust point
    pub fn add_trust_point(&mut self, certificate: impl Into<Vec<u8>>) {
        self.trust_points.insert(certificate.into());
    }

    /// Number of trust points
    pub fn len(&self) -> usize {
        self.trust_points.len()
    }

    /// Whether the repository holds no trust points
    pub fn is_empty(&self) -> bool {
        self.trust_points.is_empty()
    }
}

impl CertificateRepository for MemoryCertificateRepository {
    fn is_trust_point(&self, certificate: &[u8]) -> bool {
        self.trust_points.contains(certificate)
    }
}

/// Supplies OCSP responses for a (certificate, issuer) pair
#[async_trait]
pub trait OcspRepository: Send + Sync {
    /// Find an OCSP response for `certificate` issued by `issuer`.
    ///
    /// `uri` is the responder URI from the certificate's AIA extension when
    /// one was present; implementations may resolve the responder by other
    /// means when it is `None`. Returns `Ok(None)` when no response is
    /// available, and [`ServerNotAvailable`] when the responder exists but
    /// cannot be reached.
    async fn find_ocsp_response(
        &self,
        uri: Option<&str>,
        certificate: &[u8],
        issuer: &[u8],
        validation_date: DateTime<Utc>,
    ) -> std::result::Result<Option<Vec<u8>>, ServerNotAvailable>;
}

/// Supplies CRLs published by an issuer
#[async_trait]
pub trait CrlRepository: Send + Sync {
    /// Find the CRL published at `uri` by `issuer`, if available.
    async fn find_crl(
        &self,
        uri: &str,
        issuer: &[u8],
        validation_date: DateTime<Utc>,
    ) -> Option<Vec<u8>>;
}
