//! Basic cryptographic trust linker
//!
//! Verifies the issuer/subject relation, the child's signature against the
//! issuer key, the child's validity window, the issuer's CA constraints and
//! the child's signature algorithm. Revocation is left to the linkers that
//! run after it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use crate::cert::ParsedCert;
use crate::error::{Result, TrustLinkError, TrustReason};
use crate::policy::AlgorithmPolicy;
use crate::revocation::RevocationData;

use super::{TrustLinker, TrustLinkerResult};

/// Verifies the basic issuer/subject/signature relation of a pair
#[derive(Debug, Default, Clone, Copy)]
pub struct PublicKeyTrustLinker;

impl PublicKeyTrustLinker {
    /// Create the linker
    pub fn new() -> Self {
        Self
    }

    fn check_issuer_is_ca(&self, issuer: &ParsedCert<'_>) -> Result<()> {
        let bc = issuer
            .x509
            .get_extension_unique(&oid_registry::OID_X509_EXT_BASIC_CONSTRAINTS)
            .map_err(|e| {
                TrustLinkError::new(
                    TrustReason::ConstraintViolation,
                    format!("duplicate BasicConstraints extension: {e}"),
                )
            })?;
        match bc.map(|ext| ext.parsed_extension()) {
            Some(ParsedExtension::BasicConstraints(bc)) if bc.ca => {}
            _ => {
                return Err(TrustLinkError::new(
                    TrustReason::ConstraintViolation,
                    "issuer is not a CA (BasicConstraints)",
                ));
            }
        }

        // An absent KeyUsage extension imposes no restriction (RFC 5280 4.2.1.3)
        let ku = issuer
            .x509
            .get_extension_unique(&oid_registry::OID_X509_EXT_KEY_USAGE)
            .map_err(|e| {
                TrustLinkError::new(
                    TrustReason::ConstraintViolation,
                    format!("duplicate KeyUsage extension: {e}"),
                )
            })?;
        if let Some(ParsedExtension::KeyUsage(ku)) = ku.map(|ext| ext.parsed_extension()) {
            if !ku.key_cert_sign() {
                return Err(TrustLinkError::new(
                    TrustReason::ConstraintViolation,
                    "issuer KeyUsage does not include keyCertSign",
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TrustLinker for PublicKeyTrustLinker {
    async fn has_trust_link(
        &self,
        child: &ParsedCert<'_>,
        issuer: &ParsedCert<'_>,
        validation_date: DateTime<Utc>,
        _revocation_data: &mut RevocationData,
        policy: &dyn AlgorithmPolicy,
    ) -> Result<TrustLinkerResult> {
        if child.x509.issuer().as_raw() != issuer.x509.subject().as_raw() {
            return Err(TrustLinkError::new(
                TrustReason::InvalidSignature,
                format!(
                    "child issuer {} does not match issuer subject {}",
                    child.x509.issuer(),
                    issuer.x509.subject()
                ),
            ));
        }

        child
            .x509
            .verify_signature(Some(issuer.x509.public_key()))
            .map_err(|e| {
                TrustLinkError::new(
                    TrustReason::InvalidSignature,
                    format!("signature verification failed: {e}"),
                )
            })?;

        let ts = validation_date.timestamp();
        let validity = child.x509.validity();
        if ts < validity.not_before.timestamp() || ts > validity.not_after.timestamp() {
            return Err(TrustLinkError::new(
                TrustReason::InvalidValidityInterval,
                format!(
                    "validation date {} outside validity of {}",
                    validation_date,
                    child.x509.subject()
                ),
            ));
        }

        self.check_issuer_is_ca(issuer)?;

        policy.check_signature_algorithm(
            &child.x509.signature_algorithm.algorithm,
            validation_date,
        )?;

        tracing::debug!(
            child = %child.x509.subject(),
            issuer = %issuer.x509.subject(),
            "basic trust link established"
        );
        Ok(TrustLinkerResult::Trusted)
    }
}
