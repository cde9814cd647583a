//! # trustlink - X.509 Certificate Chain Validation
//!
//! This crate answers one question: is a given X.509 certificate chain
//! trusted as of a validation date? Its core is a pluggable trust-linking
//! pipeline: for each adjacent (child, issuer) pair in a chain, an ordered
//! sequence of trust linkers - cryptographic, revocation-based (OCSP, CRL)
//! and policy-based - produces partial verdicts that a chain-walking
//! validator resolves into a final decision.
//!
//! ## Features
//!
//! - **Basic link verification**: issuer/subject relation, signature,
//!   validity window, CA constraints
//! - **OCSP**: RFC 6960 response parsing, delegated responder authorization,
//!   freshness windows
//! - **CRL**: RFC 5280 revocation list fallback with issuer signature checks
//! - **Algorithm policy**: date-gated rejection of weak signature algorithms
//! - **Revocation evidence**: byte-exact OCSP/CRL material handed back to
//!   the caller
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//! - `validator`: chain walking and trust anchor enforcement
//! - `linkers`: the trust linker trait and its three implementations
//! - `policy`: signature algorithm acceptance
//! - `repository`: trust anchor, OCSP and CRL collaborator interfaces
//! - `revocation`: caller-owned revocation evidence accumulator
//! - `cert`: certificate views shared by the linkers
//!
//! Validation performs no I/O of its own; OCSP responses and CRLs come from
//! async repositories supplied by the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trustlink::prelude::*;
//!
//! let mut anchors = MemoryCertificateRepository::new();
//! anchors.add_trust_point(root_der.clone());
//!
//! let mut validator = TrustValidator::new(Arc::new(anchors));
//! validator.add_default_trust_linkers(ocsp_repo, crl_repo, &ValidatorConfig::default());
//!
//! validator.is_trusted(&[leaf_der, intermediate_der, root_der]).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cert;
pub mod error;
pub mod linkers;
pub mod policy;
pub mod repository;
pub mod revocation;
pub mod validator;

mod crypto;

// Re-export commonly used types
pub use error::{Result, TrustLinkError, TrustReason};
pub use linkers::{
    CrlTrustLinker, OcspTrustLinker, PublicKeyTrustLinker, TrustLinker, TrustLinkerResult,
};
pub use policy::{AlgorithmPolicy, DefaultAlgorithmPolicy};
pub use repository::{
    CertificateRepository, CrlRepository, MemoryCertificateRepository, OcspRepository,
    ServerNotAvailable,
};
pub use revocation::{CrlRevocationData, OcspRevocationData, RevocationData};
pub use validator::{TrustValidator, ValidatorConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Result, TrustLinkError, TrustReason};
    pub use crate::linkers::{
        CrlTrustLinker, OcspTrustLinker, PublicKeyTrustLinker, TrustLinker, TrustLinkerResult,
    };
    pub use crate::policy::{AlgorithmPolicy, DefaultAlgorithmPolicy};
    pub use crate::repository::{
        CertificateRepository, CrlRepository, MemoryCertificateRepository, OcspRepository,
        ServerNotAvailable,
    };
    pub use crate::revocation::RevocationData;
    pub use crate::validator::{TrustValidator, ValidatorConfig};
}
