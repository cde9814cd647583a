//! Certificate views and X.509 extension helpers
//!
//! The validation pipeline works on [`ParsedCert`], a pairing of the exact DER
//! encoding of a certificate with its parsed form. Keeping the raw bytes next
//! to the parsed view matters: trust-anchor membership and OCSP responder
//! identity are both decided by encoded-bytes equality, never by comparing
//! decoded fields.

use std::borrow::Cow;

use oid_registry::Oid;
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

use crate::error::{Result, TrustLinkError, TrustReason};

/// Authority Information Access extension (RFC 5280, 1.3.6.1.5.5.7.1.1)
pub(crate) const OID_AUTHORITY_INFO_ACCESS: Oid<'static> =
    Oid::new(Cow::Borrowed(&[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x01]));

/// id-ad-ocsp access method (RFC 5280, 1.3.6.1.5.5.7.48.1)
pub(crate) const OID_AD_OCSP: Oid<'static> =
    Oid::new(Cow::Borrowed(&[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01]));

/// id-pkix-ocsp-nocheck extension (RFC 6960, 1.3.6.1.5.5.7.48.1.5)
pub(crate) const OID_OCSP_NOCHECK: Oid<'static> = Oid::new(Cow::Borrowed(&[
    0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x05,
]));

/// CRL Distribution Points extension (RFC 5280, 2.5.29.31)
pub(crate) const OID_CRL_DISTRIBUTION_POINTS: Oid<'static> =
    Oid::new(Cow::Borrowed(&[0x55, 0x1d, 0x1f]));

/// A certificate as seen by the trust linkers: the parsed structure together
/// with the exact DER bytes it was decoded from.
#[derive(Debug)]
pub struct ParsedCert<'a> {
    /// The exact DER encoding
    pub der: &'a [u8],
    /// The parsed certificate
    pub x509: X509Certificate<'a>,
}

impl<'a> ParsedCert<'a> {
    /// Parse a DER-encoded X.509 certificate.
    ///
    /// Trailing bytes after the certificate are rejected: the encoding must be
    /// exactly one certificate, since `der` is later compared byte-for-byte
    /// against trust anchors and responder certificates.
    pub fn parse(der: &'a [u8]) -> Result<Self> {
        let (rest, x509) = X509Certificate::from_der(der).map_err(|e| {
            TrustLinkError::new(
                TrustReason::NoTrust,
                format!("certificate decoding failed: {e}"),
            )
        })?;
        if !rest.is_empty() {
            return Err(TrustLinkError::new(
                TrustReason::NoTrust,
                "trailing bytes after DER certificate",
            ));
        }
        Ok(Self { der, x509 })
    }

    /// Subject and issuer DN are byte-identical, i.e. the certificate claims
    /// to be self-issued.
    pub fn is_self_issued(&self) -> bool {
        self.x509.subject().as_raw() == self.x509.issuer().as_raw()
    }
}

/// Extract the OCSP responder URI from the child certificate's Authority
/// Information Access extension, if present.
pub(crate) fn ocsp_uri(cert: &X509Certificate<'_>) -> Option<String> {
    let ext = cert
        .get_extension_unique(&OID_AUTHORITY_INFO_ACCESS)
        .ok()
        .flatten()?;
    if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
        for desc in &aia.accessdescs {
            if desc.access_method == OID_AD_OCSP {
                if let GeneralName::URI(uri) = &desc.access_location {
                    return Some(uri.to_string());
                }
            }
        }
    }
    None
}

/// Extract all CRL distribution point URIs from the child certificate.
pub(crate) fn crl_uris(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut uris = Vec::new();
    let Some(ext) = cert
        .get_extension_unique(&OID_CRL_DISTRIBUTION_POINTS)
        .ok()
        .flatten()
    else {
        return uris;
    };
    if let ParsedExtension::CRLDistributionPoints(points) = ext.parsed_extension() {
        for point in &points.points {
            if let Some(DistributionPointName::FullName(names)) = &point.distribution_point {
                for name in names {
                    if let GeneralName::URI(uri) = name {
                        uris.push(uri.to_string());
                    }
                }
            }
        }
    }
    uris
}

/// Whether the certificate carries the id-pkix-ocsp-nocheck extension.
pub(crate) fn has_ocsp_nocheck(cert: &X509Certificate<'_>) -> bool {
    matches!(cert.get_extension_unique(&OID_OCSP_NOCHECK), Ok(Some(_)))
}

/// Whether the certificate's Extended Key Usage contains id-kp-OCSPSigning.
pub(crate) fn has_ocsp_signing_eku(cert: &X509Certificate<'_>) -> bool {
    let Ok(Some(ext)) = cert.get_extension_unique(&oid_registry::OID_X509_EXT_EXTENDED_KEY_USAGE)
    else {
        return false;
    };
    if let ParsedExtension::ExtendedKeyUsage(eku) = ext.parsed_extension() {
        return eku.ocsp_signing;
    }
    false
}

/// SHA-256 fingerprint of a DER encoding, for log lines.
pub(crate) fn fingerprint_sha256(der: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(der);
    hex::encode(hasher.finalize())
}
