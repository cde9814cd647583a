//! Trust linkers
//!
//! A trust linker examines one aspect of a (child, issuer) relationship and
//! returns a partial verdict: [`Trusted`](TrustLinkerResult::Trusted) when it
//! positively established its aspect, [`Undecided`](TrustLinkerResult::Undecided)
//! when it could not tell, or an error for a definitive violation. The
//! validator runs a configured ordered sequence of linkers per chain pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cert::ParsedCert;
use crate::error::Result;
use crate::policy::AlgorithmPolicy;
use crate::revocation::RevocationData;

mod crl;
mod ocsp;
mod public_key;

pub use crl::CrlTrustLinker;
pub use ocsp::OcspTrustLinker;
pub use public_key::PublicKeyTrustLinker;

/// Partial verdict of a single trust linker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLinkerResult {
    /// The linker positively established its aspect of the trust link
    Trusted,
    /// The linker could not reach a conclusion; the next linker may
    Undecided,
}

/// A pluggable predicate over one (child, issuer) pair
///
/// Linkers are stateless with respect to a validation call; configuration is
/// immutable after construction, so a linker may serve concurrent
/// validations.
#[async_trait]
pub trait TrustLinker: Send + Sync {
    /// Evaluate the trust link between `child` and its alleged `issuer` at
    /// `validation_date`.
    ///
    /// Linkers that consulted a revocation source attach the evidence to
    /// `revocation_data`; linkers that return
    /// [`Undecided`](TrustLinkerResult::Undecided) because nothing was
    /// available must not.
    async fn has_trust_link(
        &self,
        child: &ParsedCert<'_>,
        issuer: &ParsedCert<'_>,
        validation_date: DateTime<Utc>,
        revocation_data: &mut RevocationData,
        policy: &dyn AlgorithmPolicy,
    ) -> Result<TrustLinkerResult>;
}
