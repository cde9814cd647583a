//! Signature algorithm policy
//!
//! Decides whether a signature algorithm OID is acceptable at a given
//! validation date. The default policy accepts the modern RSA/ECDSA/Ed25519
//! algorithms unconditionally, accepts the SHA-1 family only before a
//! configurable cutoff date, and rejects everything else.

use chrono::{DateTime, Utc};
use oid_registry::Oid;

use crate::crypto;
use crate::error::{Result, TrustLinkError, TrustReason};

/// Policy deciding which signature algorithms are acceptable at a date
pub trait AlgorithmPolicy: Send + Sync {
    /// Check a signature algorithm OID against the policy.
    ///
    /// Returns an error with reason
    /// [`ConstraintViolation`](TrustReason::ConstraintViolation) if the
    /// algorithm is not allowed at `validation_date`.
    fn check_signature_algorithm(
        &self,
        oid: &Oid<'_>,
        validation_date: DateTime<Utc>,
    ) -> Result<()>;
}

/// Default algorithm policy with a date-gated SHA-1 allowance
#[derive(Debug, Clone)]
pub struct DefaultAlgorithmPolicy {
    /// SHA-1 based signatures are accepted strictly before this instant
    sha1_cutoff: DateTime<Utc>,
}

// 2016-01-01T00:00:00Z, when public CAs stopped issuing SHA-1 certificates
const SHA1_CUTOFF_EPOCH: i64 = 1_451_606_400;

impl Default for DefaultAlgorithmPolicy {
    fn default() -> Self {
        Self {
            sha1_cutoff: DateTime::from_timestamp(SHA1_CUTOFF_EPOCH, 0).unwrap_or_else(Utc::now),
        }
    }
}

impl DefaultAlgorithmPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the SHA-1 cutoff date
    pub fn with_sha1_cutoff(sha1_cutoff: DateTime<Utc>) -> Self {
        Self { sha1_cutoff }
    }

    /// The instant after which SHA-1 signatures are rejected
    pub fn sha1_cutoff(&self) -> DateTime<Utc> {
        self.sha1_cutoff
    }
}

const ALWAYS_ACCEPTED: &[&str] = &[
    crypto::SHA256_WITH_RSA,
    crypto::SHA384_WITH_RSA,
    crypto::SHA512_WITH_RSA,
    crypto::ECDSA_WITH_SHA256,
    crypto::ECDSA_WITH_SHA384,
    crypto::ED25519,
];

const SHA1_FAMILY: &[&str] = &[crypto::SHA1_WITH_RSA, crypto::ECDSA_WITH_SHA1];

impl AlgorithmPolicy for DefaultAlgorithmPolicy {
    fn check_signature_algorithm(
        &self,
        oid: &Oid<'_>,
        validation_date: DateTime<Utc>,
    ) -> Result<()> {
        let dotted = oid.to_string();
        if ALWAYS_ACCEPTED.contains(&dotted.as_str()) {
            return Ok(());
        }
        if SHA1_FAMILY.contains(&dotted.as_str()) {
            if validation_date < self.sha1_cutoff {
                return Ok(());
            }
            return Err(TrustLinkError::new(
                TrustReason::ConstraintViolation,
                format!("SHA-1 signature algorithm {dotted} not allowed at {validation_date}"),
            ));
        }
        Err(TrustLinkError::new(
            TrustReason::ConstraintViolation,
            format!("signature algorithm {dotted} not allowed"),
        ))
    }
}
