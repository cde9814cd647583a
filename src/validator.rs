//! Chain-walking trust validator
//!
//! Walks an ordered certificate chain from the end-entity to the root,
//! running the mandatory [`PublicKeyTrustLinker`] and then the configured
//! revocation linkers for every adjacent pair, and enforcing that the top of
//! the chain is a trust anchor. The validator owns no mutable state across
//! calls; once configured it may be shared between concurrent validations.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cert::{self, ParsedCert};
use crate::error::{Result, TrustLinkError, TrustReason};
use crate::linkers::{
    CrlTrustLinker, OcspTrustLinker, PublicKeyTrustLinker, TrustLinker, TrustLinkerResult,
};
use crate::policy::{AlgorithmPolicy, DefaultAlgorithmPolicy};
use crate::repository::{CertificateRepository, CrlRepository, OcspRepository};
use crate::revocation::RevocationData;

/// Tuning knobs for the default linker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Freshness tolerance around OCSP thisUpdate/nextUpdate, in seconds
    pub ocsp_freshness_secs: u64,

    /// Freshness tolerance around CRL thisUpdate/nextUpdate, in seconds
    pub crl_freshness_secs: u64,

    /// SHA-1 signatures are accepted strictly before this instant
    pub sha1_cutoff: DateTime<Utc>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        let policy = DefaultAlgorithmPolicy::default();
        Self {
            ocsp_freshness_secs: 300,
            crl_freshness_secs: 300,
            sha1_cutoff: policy.sha1_cutoff(),
        }
    }
}

impl ValidatorConfig {
    /// Parse a configuration from a TOML document
    pub fn from_toml_str(document: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(document)
    }
}

/// Validates certificate chains against a trust anchor repository
pub struct TrustValidator {
    repository: Arc<dyn CertificateRepository>,
    algorithm_policy: Arc<dyn AlgorithmPolicy>,
    public_key_linker: PublicKeyTrustLinker,
    revocation_linkers: Vec<Arc<dyn TrustLinker>>,
}

impl TrustValidator {
    /// Create a validator with no revocation linkers and the default
    /// algorithm policy. Pairs are then accepted on the basic link alone.
    pub fn new(repository: Arc<dyn CertificateRepository>) -> Self {
        Self {
            repository,
            algorithm_policy: Arc::new(DefaultAlgorithmPolicy::new()),
            public_key_linker: PublicKeyTrustLinker::new(),
            revocation_linkers: Vec::new(),
        }
    }

    /// Append a revocation trust linker; linkers run in insertion order
    pub fn add_trust_linker(&mut self, linker: Arc<dyn TrustLinker>) {
        self.revocation_linkers.push(linker);
    }

    /// Replace the algorithm policy
    pub fn set_algorithm_policy(&mut self, policy: Arc<dyn AlgorithmPolicy>) {
        self.algorithm_policy = policy;
    }

    /// Install the default linker configuration: OCSP first, CRL as the
    /// fallback, both sharing the algorithm policy derived from `config`.
    pub fn add_default_trust_linkers(
        &mut self,
        ocsp_repository: Arc<dyn OcspRepository>,
        crl_repository: Arc<dyn CrlRepository>,
        config: &ValidatorConfig,
    ) {
        self.set_algorithm_policy(Arc::new(DefaultAlgorithmPolicy::with_sha1_cutoff(
            config.sha1_cutoff,
        )));
        self.add_trust_linker(Arc::new(
            OcspTrustLinker::new(ocsp_repository)
                .with_freshness(Duration::seconds(config.ocsp_freshness_secs as i64)),
        ));
        self.add_trust_linker(Arc::new(
            CrlTrustLinker::new(crl_repository)
                .with_freshness(Duration::seconds(config.crl_freshness_secs as i64)),
        ));
    }

    /// Validate `chain` as of now.
    ///
    /// The chain is ordered end-entity first; each following certificate is
    /// the alleged issuer of the one before it.
    pub async fn is_trusted<C: AsRef<[u8]>>(&self, chain: &[C]) -> Result<()> {
        self.is_trusted_at(chain, Utc::now()).await
    }

    /// Validate `chain` as of `validation_date`.
    pub async fn is_trusted_at<C: AsRef<[u8]>>(
        &self,
        chain: &[C],
        validation_date: DateTime<Utc>,
    ) -> Result<()> {
        let mut revocation_data = RevocationData::new();
        self.is_trusted_with(chain, validation_date, &mut revocation_data)
            .await
    }

    /// Validate `chain` as of `validation_date`, collecting the revocation
    /// evidence into a caller-owned accumulator.
    pub async fn is_trusted_with<C: AsRef<[u8]>>(
        &self,
        chain: &[C],
        validation_date: DateTime<Utc>,
        revocation_data: &mut RevocationData,
    ) -> Result<()> {
        if chain.is_empty() {
            return Err(TrustLinkError::new(
                TrustReason::NoTrust,
                "empty certificate chain",
            ));
        }

        let mut parsed = Vec::with_capacity(chain.len());
        for der in chain {
            parsed.push(ParsedCert::parse(der.as_ref())?);
        }

        let root = &parsed[parsed.len() - 1];
        if !self.repository.is_trust_point(root.der) {
            return Err(TrustLinkError::new(
                TrustReason::RootNotTrusted,
                format!(
                    "chain top {} (sha256 {}) is not a trust anchor",
                    root.x509.subject(),
                    cert::fingerprint_sha256(root.der)
                ),
            ));
        }
        if root.is_self_issued() {
            // A self-signed anchor must at least pass its own basic link.
            self.public_key_linker
                .has_trust_link(
                    root,
                    root,
                    validation_date,
                    revocation_data,
                    self.algorithm_policy.as_ref(),
                )
                .await?;
        }

        for pair in parsed.windows(2) {
            let (child, issuer) = (&pair[0], &pair[1]);
            tracing::debug!(
                child = %child.x509.subject(),
                issuer = %issuer.x509.subject(),
                "validating chain pair"
            );

            self.public_key_linker
                .has_trust_link(
                    child,
                    issuer,
                    validation_date,
                    revocation_data,
                    self.algorithm_policy.as_ref(),
                )
                .await?;

            if self.revocation_linkers.is_empty() {
                continue;
            }

            let mut revocation_established = false;
            for linker in &self.revocation_linkers {
                match linker
                    .has_trust_link(
                        child,
                        issuer,
                        validation_date,
                        revocation_data,
                        self.algorithm_policy.as_ref(),
                    )
                    .await?
                {
                    TrustLinkerResult::Trusted => {
                        revocation_established = true;
                        break;
                    }
                    TrustLinkerResult::Undecided => continue,
                }
            }
            if !revocation_established {
                return Err(TrustLinkError::new(
                    TrustReason::NoTrust,
                    format!(
                        "no revocation source could establish the status of {}",
                        child.x509.subject()
                    ),
                ));
            }
        }

        tracing::debug!(length = chain.len(), "chain validated");
        Ok(())
    }
}
