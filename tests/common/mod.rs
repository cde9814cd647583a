//! Shared test PKI fixture
//!
//! Builds a real three-tier PKI (root, intermediate, leaf) with rcgen, plus
//! DER-encoded OCSP responses and CRLs signed with the corresponding CA keys,
//! and in-memory repositories the validator can be wired against.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use der::asn1::{BitString, GeneralizedTime, ObjectIdentifier, OctetString};
use der::{Decode, Encode};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use rcgen::{
    BasicConstraints, CertificateParams, CustomExtension, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose,
};
use ::time::macros::datetime;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;
use x509_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspGeneralizedTime, OcspResponse, OcspResponseStatus,
    ResponderId, ResponseBytes, ResponseData, RevokedInfo, SingleResponse, Version,
};
use x509_parser::prelude::*;

use trustlink::repository::{CrlRepository, OcspRepository, ServerNotAvailable};

pub const OCSP_URI: &str = "http://ocsp.test.example.com";
pub const INTERMEDIATE_CRL_URI: &str = "http://crl.test.example.com/intermediate.crl";
pub const ROOT_CRL_URI: &str = "http://crl.test.example.com/root.crl";

const ID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const ID_PKIX_OCSP_BASIC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.1");
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

/// The fixed validation date all scenarios run at
pub fn validation_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// One certificate-holding party in the test PKI
pub struct TestEntity {
    pub cert_der: Vec<u8>,
    pub key: KeyPair,
    pub params: CertificateParams,
}

impl TestEntity {
    /// rcgen issuer handle for signing child certificates
    pub fn issuer(&self) -> Issuer<'static, KeyPair> {
        Issuer::new(
            self.params.clone(),
            KeyPair::try_from(self.key.serialize_der()).expect("key pair"),
        )
    }

    /// The same private key as a p256 signer, for OCSP responses and CRLs
    pub fn p256_signer(&self) -> SigningKey {
        SigningKey::from_pkcs8_der(&self.key.serialize_der()).expect("p256 signing key")
    }

    /// DER INTEGER content bytes of the certificate serial
    pub fn serial(&self) -> Vec<u8> {
        let (_, cert) = X509Certificate::from_der(&self.cert_der).expect("certificate");
        cert.raw_serial().to_vec()
    }
}

fn base_params(cn: &str) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::new()).expect("certificate params");
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    dn.push(DnType::OrganizationName, "Trustlink Test PKI");
    params.distinguished_name = dn;
    params.not_before = datetime!(2024-01-01 00:00 UTC);
    params.not_after = datetime!(2025-01-01 00:00 UTC);
    params
}

/// Authority Information Access with a single id-ad-ocsp URI:
/// SEQUENCE { SEQUENCE { OID id-ad-ocsp, [6] IA5String uri } }
fn authority_info_access(uri: &str) -> CustomExtension {
    let mut access = vec![
        0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01,
    ];
    access.push(0x86);
    access.push(uri.len() as u8);
    access.extend_from_slice(uri.as_bytes());
    let mut desc = vec![0x30, access.len() as u8];
    desc.extend_from_slice(&access);
    let mut seq = vec![0x30, desc.len() as u8];
    seq.extend_from_slice(&desc);
    CustomExtension::from_oid_content(&[1, 3, 6, 1, 5, 5, 7, 1, 1], seq)
}

/// CRL Distribution Points with a single URI:
/// SEQUENCE { SEQUENCE { [0] { [0] { [6] IA5String uri } } } }
fn crl_distribution_points(uri: &str) -> CustomExtension {
    let mut uri_tlv = vec![0x86, uri.len() as u8];
    uri_tlv.extend_from_slice(uri.as_bytes());
    let mut full_name = vec![0xa0, uri_tlv.len() as u8];
    full_name.extend_from_slice(&uri_tlv);
    let mut dp_name = vec![0xa0, full_name.len() as u8];
    dp_name.extend_from_slice(&full_name);
    let mut dp = vec![0x30, dp_name.len() as u8];
    dp.extend_from_slice(&dp_name);
    let mut seq = vec![0x30, dp.len() as u8];
    seq.extend_from_slice(&dp);
    CustomExtension::from_oid_content(&[2, 5, 29, 31], seq)
}

/// id-pkix-ocsp-nocheck with an ASN.1 NULL value
fn ocsp_nocheck() -> CustomExtension {
    CustomExtension::from_oid_content(&[1, 3, 6, 1, 5, 5, 7, 48, 1, 5], vec![0x05, 0x00])
}

pub fn make_root(cn: &str) -> TestEntity {
    let mut params = base_params(cn);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    let key = KeyPair::generate().expect("key pair");
    let cert = params.clone().self_signed(&key).expect("self-signed root");
    TestEntity {
        cert_der: cert.der().to_vec(),
        key,
        params,
    }
}

pub fn make_intermediate(cn: &str, issuer: &TestEntity, crl_uri: Option<&str>) -> TestEntity {
    let mut params = base_params(cn);
    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.use_authority_key_identifier_extension = true;
    if let Some(uri) = crl_uri {
        params.custom_extensions.push(crl_distribution_points(uri));
    }
    let key = KeyPair::generate().expect("key pair");
    let cert = params
        .clone()
        .signed_by(&key, &issuer.issuer())
        .expect("intermediate certificate");
    TestEntity {
        cert_der: cert.der().to_vec(),
        key,
        params,
    }
}

pub fn make_leaf(
    cn: &str,
    issuer: &TestEntity,
    ocsp_uri: Option<&str>,
    crl_uri: Option<&str>,
) -> TestEntity {
    let mut params = base_params(cn);
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.use_authority_key_identifier_extension = true;
    if let Some(uri) = ocsp_uri {
        params.custom_extensions.push(authority_info_access(uri));
    }
    if let Some(uri) = crl_uri {
        params.custom_extensions.push(crl_distribution_points(uri));
    }
    let key = KeyPair::generate().expect("key pair");
    let cert = params
        .clone()
        .signed_by(&key, &issuer.issuer())
        .expect("leaf certificate");
    TestEntity {
        cert_der: cert.der().to_vec(),
        key,
        params,
    }
}

/// A dedicated OCSP signing certificate issued by `issuer`
pub fn make_ocsp_responder(
    cn: &str,
    issuer: &TestEntity,
    with_nocheck: bool,
    with_eku: bool,
) -> TestEntity {
    let mut params = base_params(cn);
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    if with_eku {
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::OcspSigning];
    }
    params.use_authority_key_identifier_extension = true;
    if with_nocheck {
        params.custom_extensions.push(ocsp_nocheck());
    }
    let key = KeyPair::generate().expect("key pair");
    let cert = params
        .clone()
        .signed_by(&key, &issuer.issuer())
        .expect("responder certificate");
    TestEntity {
        cert_der: cert.der().to_vec(),
        key,
        params,
    }
}

/// The standard three-tier chain used by most scenarios
pub struct TestPki {
    pub root: TestEntity,
    pub intermediate: TestEntity,
    pub leaf: TestEntity,
}

pub fn build_test_pki() -> TestPki {
    let root = make_root("Trustlink Test Root CA");
    let intermediate =
        make_intermediate("Trustlink Test Intermediate CA", &root, Some(ROOT_CRL_URI));
    let leaf = make_leaf(
        "leaf.test.example.com",
        &intermediate,
        Some(OCSP_URI),
        Some(INTERMEDIATE_CRL_URI),
    );
    TestPki {
        root,
        intermediate,
        leaf,
    }
}

impl TestPki {
    /// End-entity-first chain as DER blobs
    pub fn chain(&self) -> Vec<Vec<u8>> {
        vec![
            self.leaf.cert_der.clone(),
            self.intermediate.cert_der.clone(),
            self.root.cert_der.clone(),
        ]
    }
}

fn gtime(at: DateTime<Utc>) -> OcspGeneralizedTime {
    OcspGeneralizedTime(
        GeneralizedTime::from_unix_duration(std::time::Duration::from_secs(at.timestamp() as u64))
            .expect("generalized time"),
    )
}

pub fn good() -> CertStatus {
    CertStatus::Good(der::asn1::Null)
}

pub fn revoked_at(at: DateTime<Utc>) -> CertStatus {
    CertStatus::Revoked(RevokedInfo {
        revocation_time: gtime(at),
        revocation_reason: None,
    })
}

pub fn unknown() -> CertStatus {
    CertStatus::Unknown(der::asn1::Null)
}

/// Build a DER-encoded OCSP response for `child_der` as certified by
/// `issuer_der`, signed with `signer` and carrying `embedded_certs` in the
/// basic response.
pub fn build_ocsp_response(
    child_der: &[u8],
    issuer_der: &[u8],
    status: CertStatus,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    signer: &SigningKey,
    embedded_certs: &[&[u8]],
) -> Vec<u8> {
    let (_, issuer) = X509Certificate::from_der(issuer_der).expect("issuer certificate");
    let (_, child) = X509Certificate::from_der(child_der).expect("child certificate");

    let name_hash = ring::digest::digest(
        &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
        issuer.subject().as_raw(),
    );
    let key_hash = ring::digest::digest(
        &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
        issuer.public_key().subject_public_key.data.as_ref(),
    );

    let cert_id = CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: ID_SHA1,
            parameters: None,
        },
        issuer_name_hash: OctetString::new(name_hash.as_ref()).expect("issuer name hash"),
        issuer_key_hash: OctetString::new(key_hash.as_ref()).expect("issuer key hash"),
        serial_number: SerialNumber::new(child.raw_serial()).expect("serial number"),
    };

    let single = SingleResponse {
        cert_id,
        cert_status: status,
        this_update: gtime(this_update),
        next_update: next_update.map(gtime),
        single_extensions: None,
    };

    let tbs = ResponseData {
        version: Version::V1,
        responder_id: ResponderId::ByKey(
            OctetString::new(key_hash.as_ref()).expect("responder id"),
        ),
        produced_at: gtime(this_update),
        responses: vec![single],
        response_extensions: None,
    };

    let tbs_der = tbs.to_der().expect("tbsResponseData");
    let signature: Signature = signer.sign(&tbs_der);
    let signature_der = signature.to_der();

    let basic = BasicOcspResponse {
        tbs_response_data: tbs,
        signature_algorithm: AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA256,
            parameters: None,
        },
        signature: BitString::from_bytes(signature_der.as_bytes()).expect("signature bits"),
        certs: if embedded_certs.is_empty() {
            None
        } else {
            Some(
                embedded_certs
                    .iter()
                    .map(|der| x509_cert::Certificate::from_der(der).expect("embedded certificate"))
                    .collect(),
            )
        },
    };

    let response = OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: Some(ResponseBytes {
            response_type: ID_PKIX_OCSP_BASIC,
            response: OctetString::new(basic.to_der().expect("basic response"))
                .expect("response octets"),
        }),
    };
    response.to_der().expect("OCSP response")
}

/// An OCSP response whose outer status is tryLater, carrying no basic response
pub fn build_try_later_response() -> Vec<u8> {
    let response = OcspResponse {
        response_status: OcspResponseStatus::TryLater,
        response_bytes: None,
    };
    response.to_der().expect("OCSP response")
}

fn crl_time(at: DateTime<Utc>) -> Time {
    Time::GeneralTime(
        GeneralizedTime::from_unix_duration(std::time::Duration::from_secs(at.timestamp() as u64))
            .expect("generalized time"),
    )
}

/// Build a DER-encoded CRL issued and signed by the holder of `issuer_der`.
pub fn build_crl(
    issuer_der: &[u8],
    signer: &SigningKey,
    revoked_serials: &[(Vec<u8>, DateTime<Utc>)],
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
) -> Vec<u8> {
    let (_, issuer) = X509Certificate::from_der(issuer_der).expect("issuer certificate");
    let issuer_name = Name::from_der(issuer.subject().as_raw()).expect("issuer name");

    let revoked: Vec<RevokedCert> = revoked_serials
        .iter()
        .map(|(serial, at)| RevokedCert {
            serial_number: SerialNumber::new(serial).expect("serial number"),
            revocation_date: crl_time(*at),
            crl_entry_extensions: None,
        })
        .collect();

    let algorithm = AlgorithmIdentifierOwned {
        oid: ECDSA_WITH_SHA256,
        parameters: None,
    };
    let tbs = TbsCertList {
        version: x509_cert::Version::V2,
        signature: algorithm.clone(),
        issuer: issuer_name,
        this_update: crl_time(this_update),
        next_update: next_update.map(crl_time),
        revoked_certificates: if revoked.is_empty() {
            None
        } else {
            Some(revoked)
        },
        crl_extensions: None,
    };

    let tbs_der = tbs.to_der().expect("tbsCertList");
    let signature: Signature = signer.sign(&tbs_der);
    let signature_der = signature.to_der();

    let crl = CertificateList {
        tbs_cert_list: tbs,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(signature_der.as_bytes()).expect("signature bits"),
    };
    crl.to_der().expect("CRL")
}

/// OCSP repository resolving responses by the child certificate's serial
#[derive(Default)]
pub struct MapOcspRepository {
    responses: HashMap<Vec<u8>, Vec<u8>>,
    pub unavailable: bool,
}

impl MapOcspRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, child_der: &[u8], response: Vec<u8>) {
        let (_, child) = X509Certificate::from_der(child_der).expect("child certificate");
        self.responses.insert(child.raw_serial().to_vec(), response);
    }
}

#[async_trait]
impl OcspRepository for MapOcspRepository {
    async fn find_ocsp_response(
        &self,
        _uri: Option<&str>,
        certificate: &[u8],
        _issuer: &[u8],
        _validation_date: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>, ServerNotAvailable> {
        if self.unavailable {
            return Err(ServerNotAvailable("test responder down".to_string()));
        }
        let (_, child) = X509Certificate::from_der(certificate)
            .map_err(|e| ServerNotAvailable(e.to_string()))?;
        Ok(self.responses.get(child.raw_serial()).cloned())
    }
}

/// CRL repository resolving lists by distribution point URI
#[derive(Default)]
pub struct MapCrlRepository {
    crls: HashMap<String, Vec<u8>>,
}

impl MapCrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: &str, crl: Vec<u8>) {
        self.crls.insert(uri.to_string(), crl);
    }
}

#[async_trait]
impl CrlRepository for MapCrlRepository {
    async fn find_crl(
        &self,
        uri: &str,
        _issuer: &[u8],
        _validation_date: DateTime<Utc>,
    ) -> Option<Vec<u8>> {
        self.crls.get(uri).cloned()
    }
}
