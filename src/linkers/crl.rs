//! CRL revocation trust linker
//!
//! Fallback revocation source consulted when OCSP could not decide. Locates
//! the child's CRL distribution points, fetches the list through a
//! [`CrlRepository`], verifies it against the issuer key and scans it for the
//! child's serial number. Like the OCSP linker it soft-fails to `Undecided`
//! on everything except a definitive revocation entry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use x509_parser::prelude::*;

use crate::cert::{self, ParsedCert};
use crate::error::{Result, TrustLinkError, TrustReason};
use crate::policy::AlgorithmPolicy;
use crate::repository::CrlRepository;
use crate::revocation::RevocationData;

use super::{TrustLinker, TrustLinkerResult};

/// Revocation verdict from a certificate revocation list
pub struct CrlTrustLinker {
    repository: Arc<dyn CrlRepository>,
    freshness: Duration,
}

impl CrlTrustLinker {
    /// Create a linker backed by the given repository, with the default
    /// freshness tolerance of five minutes.
    pub fn new(repository: Arc<dyn CrlRepository>) -> Self {
        Self {
            repository,
            freshness: Duration::minutes(5),
        }
    }

    /// Override the freshness tolerance applied around thisUpdate/nextUpdate
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    async fn fetch(
        &self,
        uris: &[String],
        issuer: &ParsedCert<'_>,
        validation_date: DateTime<Utc>,
    ) -> Option<(Vec<u8>, String)> {
        for uri in uris {
            if let Some(encoded) = self
                .repository
                .find_crl(uri, issuer.der, validation_date)
                .await
            {
                return Some((encoded, uri.clone()));
            }
            tracing::debug!(%uri, "no CRL available at distribution point");
        }
        None
    }
}

#[async_trait]
impl TrustLinker for CrlTrustLinker {
    async fn has_trust_link(
        &self,
        child: &ParsedCert<'_>,
        issuer: &ParsedCert<'_>,
        validation_date: DateTime<Utc>,
        revocation_data: &mut RevocationData,
        policy: &dyn AlgorithmPolicy,
    ) -> Result<TrustLinkerResult> {
        let uris = cert::crl_uris(&child.x509);
        if uris.is_empty() {
            tracing::debug!(child = %child.x509.subject(), "no CRL distribution points");
            return Ok(TrustLinkerResult::Undecided);
        }

        let Some((encoded, uri)) = self.fetch(&uris, issuer, validation_date).await else {
            return Ok(TrustLinkerResult::Undecided);
        };

        let Ok((rest, crl)) = CertificateRevocationList::from_der(&encoded) else {
            tracing::warn!(%uri, "undecodable CRL");
            return Ok(TrustLinkerResult::Undecided);
        };
        if !rest.is_empty() {
            tracing::warn!(%uri, "trailing bytes after DER CRL");
            return Ok(TrustLinkerResult::Undecided);
        }

        if crl.verify_signature(issuer.x509.public_key()).is_err() {
            tracing::warn!(%uri, "CRL signature not made by issuer");
            return Ok(TrustLinkerResult::Undecided);
        }

        policy.check_signature_algorithm(&crl.signature_algorithm.algorithm, validation_date)?;

        let ts = validation_date.timestamp();
        let this_update = crl.last_update().timestamp();
        let next_update = crl.next_update().map(|t| t.timestamp()).unwrap_or(this_update);
        let tolerance = self.freshness.num_seconds();
        if ts < this_update - tolerance || ts > next_update + tolerance {
            tracing::debug!(%uri, "CRL outside freshness window");
            return Ok(TrustLinkerResult::Undecided);
        }

        let serial = child.x509.raw_serial();
        for revoked in crl.iter_revoked_certificates() {
            if revoked.raw_serial() != serial {
                continue;
            }
            revocation_data.add_crl(encoded.clone(), Some(uri.clone()));
            let reason = revoked
                .reason_code()
                .map(|(_, code)| format!(" ({code})"))
                .unwrap_or_default();
            return Err(TrustLinkError::new(
                TrustReason::InvalidRevocationStatus,
                format!(
                    "certificate {} revoked at {}{reason}",
                    child.x509.subject(),
                    revoked.revocation_date
                ),
            ));
        }

        tracing::debug!(
            child = %child.x509.subject(),
            %uri,
            "serial not present in CRL"
        );
        revocation_data.add_crl(encoded, Some(uri));
        Ok(TrustLinkerResult::Trusted)
    }
}
