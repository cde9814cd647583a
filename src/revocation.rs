//! Revocation evidence accumulator
//!
//! A [`RevocationData`] is owned by the caller of a validation and collects
//! the exact encoded bytes of every OCSP response and CRL that was actually
//! consulted. Linkers that came up empty-handed append nothing, so after a
//! validation the accumulator is a faithful record of the evidence the
//! decision rests on.

/// An OCSP response attached as revocation evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspRevocationData {
    /// The DER-encoded OCSP response, byte-identical to what the repository
    /// returned
    pub response: Vec<u8>,
    /// The responder URI the response was associated with, if any
    pub uri: Option<String>,
}

/// A CRL attached as revocation evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlRevocationData {
    /// The DER-encoded CRL, byte-identical to what the repository returned
    pub crl: Vec<u8>,
    /// The distribution point URI the CRL was fetched from, if any
    pub uri: Option<String>,
}

/// Accumulator for revocation evidence gathered during one validation call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RevocationData {
    ocsp: Vec<OcspRevocationData>,
    crl: Vec<CrlRevocationData>,
}

impl RevocationData {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an OCSP response that was consulted
    pub fn add_ocsp(&mut self, response: Vec<u8>, uri: Option<String>) {
        self.ocsp.push(OcspRevocationData { response, uri });
    }

    /// Attach a CRL that was consulted
    pub fn add_crl(&mut self, crl: Vec<u8>, uri: Option<String>) {
        self.crl.push(CrlRevocationData { crl, uri });
    }

    /// OCSP responses consulted so far
    pub fn ocsp(&self) -> &[OcspRevocationData] {
        &self.ocsp
    }

    /// CRLs consulted so far
    pub fn crl(&self) -> &[CrlRevocationData] {
        &self.crl
    }

    /// Whether any evidence has been attached
    pub fn is_empty(&self) -> bool {
        self.ocsp.is_empty() && self.crl.is_empty()
    }
}
