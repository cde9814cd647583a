//! OCSP revocation trust linker
//!
//! Resolves the revocation status of a chain pair from an OCSP response
//! (RFC 6960). The linker is deliberately soft: a missing response, an outer
//! error status, an unverifiable signature or a misconfigured delegated
//! responder all yield `Undecided` so that a CRL linker can still decide.
//! Only a definitive revoked/unknown certificate status is a failure.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use oid_registry::Oid;
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use x509_ocsp::{BasicOcspResponse, CertStatus, OcspGeneralizedTime, OcspResponse, OcspResponseStatus};

use crate::cert::{self, ParsedCert};
use crate::crypto;
use crate::error::{Result, TrustLinkError, TrustReason};
use crate::policy::AlgorithmPolicy;
use crate::repository::OcspRepository;
use crate::revocation::RevocationData;

use super::{PublicKeyTrustLinker, TrustLinker, TrustLinkerResult};

const ID_PKIX_OCSP_BASIC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.1");
const ID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");

/// Revocation verdict from OCSP
pub struct OcspTrustLinker {
    repository: Arc<dyn OcspRepository>,
    freshness: Duration,
    public_key_linker: PublicKeyTrustLinker,
}

impl OcspTrustLinker {
    /// Create a linker backed by the given repository, with the default
    /// freshness tolerance of five minutes.
    pub fn new(repository: Arc<dyn OcspRepository>) -> Self {
        Self {
            repository,
            freshness: Duration::minutes(5),
            public_key_linker: PublicKeyTrustLinker::new(),
        }
    }

    /// Override the freshness tolerance applied around thisUpdate/nextUpdate
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    /// Signature check over the DER-encoded tbsResponseData.
    fn basic_signature_valid(
        &self,
        basic: &BasicOcspResponse,
        signer: &ParsedCert<'_>,
    ) -> bool {
        let Ok(tbs) = basic.tbs_response_data.to_der() else {
            return false;
        };
        let Some(signature) = basic.signature.as_bytes() else {
            return false;
        };
        let oid = basic.signature_algorithm.oid.to_string();
        crypto::verify_signed_data(signer.x509.public_key(), &oid, signature, &tbs)
    }

    /// Validate a delegated responder certificate against the issuing CA.
    ///
    /// Returns `true` when the responder is authorized to sign OCSP responses
    /// for `issuer`; any shortfall is advisory and reported as `false`.
    async fn delegated_responder_authorized(
        &self,
        responder: &ParsedCert<'_>,
        issuer: &ParsedCert<'_>,
        validation_date: DateTime<Utc>,
        revocation_data: &mut RevocationData,
        policy: &dyn AlgorithmPolicy,
    ) -> Result<bool> {
        policy.check_signature_algorithm(
            &responder.x509.signature_algorithm.algorithm,
            validation_date,
        )?;

        let link = self
            .public_key_linker
            .has_trust_link(responder, issuer, validation_date, revocation_data, policy)
            .await;
        match link {
            Ok(TrustLinkerResult::Trusted) => {}
            Ok(TrustLinkerResult::Undecided) | Err(_) => {
                tracing::warn!(
                    responder = %responder.x509.subject(),
                    "delegated OCSP responder certificate not linked to issuing CA"
                );
                return Ok(false);
            }
        }

        if !cert::has_ocsp_nocheck(&responder.x509) {
            tracing::warn!(
                responder = %responder.x509.subject(),
                "delegated OCSP responder missing id-pkix-ocsp-nocheck"
            );
            return Ok(false);
        }

        if !cert::has_ocsp_signing_eku(&responder.x509) {
            tracing::warn!(
                responder = %responder.x509.subject(),
                "delegated OCSP responder missing OCSPSigning extended key usage"
            );
            return Ok(false);
        }

        Ok(true)
    }
}

#[async_trait]
impl TrustLinker for OcspTrustLinker {
    async fn has_trust_link(
        &self,
        child: &ParsedCert<'_>,
        issuer: &ParsedCert<'_>,
        validation_date: DateTime<Utc>,
        revocation_data: &mut RevocationData,
        policy: &dyn AlgorithmPolicy,
    ) -> Result<TrustLinkerResult> {
        // A missing AIA extension is not fatal; the repository may resolve
        // the responder by other means.
        let uri = cert::ocsp_uri(&child.x509);

        let encoded = match self
            .repository
            .find_ocsp_response(uri.as_deref(), child.der, issuer.der, validation_date)
            .await
        {
            Ok(Some(encoded)) => encoded,
            Ok(None) => {
                tracing::debug!(uri = ?uri, "no OCSP response available");
                return Ok(TrustLinkerResult::Undecided);
            }
            Err(e) => {
                return Err(TrustLinkError::with_source(
                    TrustReason::OcspUnavailable,
                    format!("OCSP responder unreachable for {}", child.x509.subject()),
                    e,
                ));
            }
        };

        let Ok(response) = OcspResponse::from_der(&encoded) else {
            tracing::warn!("undecodable OCSP response");
            return Ok(TrustLinkerResult::Undecided);
        };
        if response.response_status != OcspResponseStatus::Successful {
            tracing::debug!(status = ?response.response_status, "OCSP response not successful");
            return Ok(TrustLinkerResult::Undecided);
        }
        let Some(response_bytes) = response.response_bytes else {
            return Ok(TrustLinkerResult::Undecided);
        };
        if response_bytes.response_type != ID_PKIX_OCSP_BASIC {
            tracing::debug!(response_type = %response_bytes.response_type, "unsupported OCSP response type");
            return Ok(TrustLinkerResult::Undecided);
        }
        let Ok(basic) = BasicOcspResponse::from_der(response_bytes.response.as_bytes()) else {
            tracing::warn!("undecodable basic OCSP response");
            return Ok(TrustLinkerResult::Undecided);
        };

        let signature_oid = Oid::new(Cow::Borrowed(basic.signature_algorithm.oid.as_bytes()));
        policy.check_signature_algorithm(&signature_oid, validation_date)?;

        // Identify the responder and verify the response signature.
        let embedded: Vec<Vec<u8>> = match &basic.certs {
            Some(certs) => {
                let mut encoded_certs = Vec::with_capacity(certs.len());
                for c in certs {
                    match c.to_der() {
                        Ok(der) => encoded_certs.push(der),
                        Err(_) => return Ok(TrustLinkerResult::Undecided),
                    }
                }
                encoded_certs
            }
            None => Vec::new(),
        };

        if embedded.is_empty() {
            // The issuing CA signed the response itself.
            if !self.basic_signature_valid(&basic, issuer) {
                tracing::warn!("OCSP response signature not made by issuing CA");
                return Ok(TrustLinkerResult::Undecided);
            }
        } else {
            let Ok(responder) = ParsedCert::parse(&embedded[0]) else {
                return Ok(TrustLinkerResult::Undecided);
            };
            if !self.basic_signature_valid(&basic, &responder) {
                tracing::warn!("OCSP response signature not made by embedded responder");
                return Ok(TrustLinkerResult::Undecided);
            }
            if responder.der != issuer.der {
                // Delegated responder: its chain must lead to the issuing CA.
                if embedded.len() >= 2 && embedded[1] != issuer.der {
                    tracing::debug!("OCSP responder chain does not terminate at issuing CA");
                    return Ok(TrustLinkerResult::Undecided);
                }
                let authorized = self
                    .delegated_responder_authorized(
                        &responder,
                        issuer,
                        validation_date,
                        revocation_data,
                        policy,
                    )
                    .await?;
                if !authorized {
                    return Ok(TrustLinkerResult::Undecided);
                }
            }
        }

        // Match the single responses against the expected SHA-1 CertID.
        let name_hash = digest(&SHA1_FOR_LEGACY_USE_ONLY, issuer.x509.subject().as_raw());
        let key_hash = digest(
            &SHA1_FOR_LEGACY_USE_ONLY,
            issuer.x509.public_key().subject_public_key.data.as_ref(),
        );
        let serial = child.x509.raw_serial();

        for single in &basic.tbs_response_data.responses {
            let cert_id = &single.cert_id;
            if cert_id.hash_algorithm.oid != ID_SHA1
                || cert_id.issuer_name_hash.as_bytes() != name_hash.as_ref()
                || cert_id.issuer_key_hash.as_bytes() != key_hash.as_ref()
                || cert_id.serial_number.as_bytes() != serial
            {
                continue;
            }

            let Some(this_update) = to_datetime(&single.this_update) else {
                continue;
            };
            let next_update = single
                .next_update
                .as_ref()
                .and_then(to_datetime)
                .unwrap_or(this_update);
            let begin = this_update - self.freshness;
            let end = next_update + self.freshness;
            if validation_date < begin || validation_date > end {
                tracing::debug!(
                    %this_update,
                    %next_update,
                    %validation_date,
                    "OCSP single response outside freshness window"
                );
                continue;
            }

            return match &single.cert_status {
                CertStatus::Good(_) => {
                    tracing::debug!(
                        child = %child.x509.subject(),
                        fingerprint = %cert::fingerprint_sha256(child.der),
                        "OCSP reports good"
                    );
                    revocation_data.add_ocsp(encoded, uri);
                    Ok(TrustLinkerResult::Trusted)
                }
                CertStatus::Revoked(info) => {
                    revocation_data.add_ocsp(encoded, uri);
                    let revoked_at = to_datetime(&info.revocation_time)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown time".to_string());
                    Err(TrustLinkError::new(
                        TrustReason::InvalidRevocationStatus,
                        format!(
                            "certificate {} revoked at {revoked_at}",
                            child.x509.subject()
                        ),
                    ))
                }
                CertStatus::Unknown(_) => {
                    revocation_data.add_ocsp(encoded, uri);
                    Err(TrustLinkError::new(
                        TrustReason::InvalidRevocationStatus,
                        format!(
                            "OCSP responder does not know certificate {}",
                            child.x509.subject()
                        ),
                    ))
                }
            };
        }

        tracing::debug!("no usable single response in OCSP response");
        Ok(TrustLinkerResult::Undecided)
    }
}

/// UTC instant from an OCSP GeneralizedTime; sub-second precision dropped.
fn to_datetime(time: &OcspGeneralizedTime) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(time.0.to_unix_duration().as_secs()).ok()?;
    DateTime::from_timestamp(secs, 0)
}
