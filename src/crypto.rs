//! Raw signature verification for OCSP responses
//!
//! Certificate and CRL signatures are checked through `x509-parser`'s verify
//! support. OCSP basic responses have no such helper, so the responder
//! signature over the DER-encoded `tbsResponseData` is verified here with
//! `ring`, dispatching on the signature algorithm OID and the responder key's
//! SubjectPublicKeyInfo.

use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use x509_parser::x509::SubjectPublicKeyInfo;

pub(crate) const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
pub(crate) const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub(crate) const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
pub(crate) const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
pub(crate) const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
pub(crate) const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub(crate) const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub(crate) const ED25519: &str = "1.3.101.112";

const CURVE_P256: &str = "1.2.840.10045.3.1.7";
const CURVE_P384: &str = "1.3.132.0.34";

/// Pick the ring verification algorithm for a signature OID, consulting the
/// key's curve parameters for ECDSA.
fn verification_algorithm(
    signature_oid: &str,
    spki: &SubjectPublicKeyInfo<'_>,
) -> Option<&'static dyn VerificationAlgorithm> {
    match signature_oid {
        SHA1_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY),
        SHA256_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA256),
        SHA384_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA384),
        SHA512_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA512),
        ECDSA_WITH_SHA256 => match named_curve(spki)?.as_str() {
            CURVE_P256 => Some(&signature::ECDSA_P256_SHA256_ASN1),
            CURVE_P384 => Some(&signature::ECDSA_P384_SHA256_ASN1),
            _ => None,
        },
        ECDSA_WITH_SHA384 => match named_curve(spki)?.as_str() {
            CURVE_P256 => Some(&signature::ECDSA_P256_SHA384_ASN1),
            CURVE_P384 => Some(&signature::ECDSA_P384_SHA384_ASN1),
            _ => None,
        },
        ED25519 => Some(&signature::ED25519),
        _ => None,
    }
}

/// The named-curve OID from an EC SubjectPublicKeyInfo's algorithm parameters.
fn named_curve(spki: &SubjectPublicKeyInfo<'_>) -> Option<String> {
    let params = spki.algorithm.parameters.as_ref()?;
    let oid = oid_registry::Oid::try_from(params.clone()).ok()?;
    Some(oid.to_string())
}

/// Verify `signature` over `message` with the given public key.
///
/// Returns `false` on any mismatch, including an algorithm this module does
/// not know how to dispatch; callers treat that as an unverifiable signature.
pub(crate) fn verify_signed_data(
    spki: &SubjectPublicKeyInfo<'_>,
    signature_oid: &str,
    signature: &[u8],
    message: &[u8],
) -> bool {
    let Some(algorithm) = verification_algorithm(signature_oid, spki) else {
        tracing::debug!(oid = signature_oid, "no verification algorithm for OID");
        return false;
    };
    let key = UnparsedPublicKey::new(algorithm, spki.subject_public_key.data.as_ref());
    key.verify(message, signature).is_ok()
}
