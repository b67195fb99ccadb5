//! Builders for programmatically generated certificates and CRLs used by the
//! integration tests. Signatures are placeholders; tests register an
//! accept-all verification callback so structural checks can be exercised
//! without real key material.

#![allow(dead_code)]

use core::str::FromStr;
use core::time::Duration;

use der::asn1::{BitString, Ia5String, ObjectIdentifier, OctetString, Uint, UtcTime};
use der::Encode;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::certpolicy::PolicyInformation;
use x509_cert::ext::pkix::crl::CrlReason;
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::crl::dp::Reasons;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    BasicConstraints, CertificatePolicies, IssuingDistributionPoint, KeyUsage, KeyUsages,
    NameConstraints, PolicyMapping, PolicyMappings, SubjectAltName,
};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::{Certificate, TbsCertificate, Version};

use const_oid::db::rfc5912::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES, ID_CE_CRL_NUMBER, ID_CE_CRL_REASONS,
    ID_CE_DELTA_CRL_INDICATOR, ID_CE_ISSUING_DISTRIBUTION_POINT, ID_CE_KEY_USAGE,
    ID_CE_NAME_CONSTRAINTS, ID_CE_POLICY_MAPPINGS, ID_CE_SUBJECT_ALT_NAME,
};

use pkipath::{
    populate_5280_pki_environment, CertificationPathSettings, ParsedCertificate, PkiEnvironment,
    Result, ValidationTime,
};

pub const NOT_BEFORE: u64 = 1_500_000_000;
pub const NOT_AFTER: u64 = 1_700_000_000;
pub const TOI: u64 = 1_600_000_000;

pub fn sig_alg() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11"),
        parameters: None,
    }
}

fn sample_spki(tag: u8) -> SubjectPublicKeyInfoOwned {
    SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1"),
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(&[tag; 16]).unwrap(),
    }
}

pub fn utc(secs: u64) -> Time {
    Time::UtcTime(UtcTime::from_unix_duration(Duration::from_secs(secs)).unwrap())
}

pub fn accept_all(
    _pe: &PkiEnvironment,
    _msg: &[u8],
    _sig: &[u8],
    _alg: &AlgorithmIdentifierOwned,
    _spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    Ok(())
}

/// Environment with the RFC 5280 validator and an accept-all signature
/// verification callback.
pub fn test_environment() -> PkiEnvironment {
    let mut pe = PkiEnvironment::new();
    populate_5280_pki_environment(&mut pe);
    pe.clear_verify_signature_message_callbacks();
    pe.add_verify_signature_message_callback(accept_all);
    pe
}

/// Settings pinned to the shared time of interest with revocation disabled;
/// revocation tests opt back in.
pub fn test_settings() -> CertificationPathSettings {
    CertificationPathSettings {
        time_of_interest: ValidationTime::from_unix_secs(TOI).unwrap(),
        check_revocation_status: false,
        ..Default::default()
    }
}

pub fn build_cert_with_validity(
    subject: &str,
    issuer: &str,
    serial: u8,
    nb: u64,
    na: u64,
    exts: Vec<Extension>,
) -> ParsedCertificate {
    let tbs = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[serial]).unwrap(),
        signature: sig_alg(),
        issuer: Name::from_str(issuer).unwrap(),
        validity: Validity {
            not_before: utc(nb),
            not_after: utc(na),
        },
        subject: Name::from_str(subject).unwrap(),
        subject_public_key_info: sample_spki(serial),
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: if exts.is_empty() { None } else { Some(exts) },
    };
    let cert = Certificate {
        tbs_certificate: tbs,
        signature_algorithm: sig_alg(),
        signature: BitString::from_bytes(&[0xA5; 8]).unwrap(),
    };
    ParsedCertificate::try_from(cert).unwrap()
}

pub fn build_cert(
    subject: &str,
    issuer: &str,
    serial: u8,
    exts: Vec<Extension>,
) -> ParsedCertificate {
    build_cert_with_validity(subject, issuer, serial, NOT_BEFORE, NOT_AFTER, exts)
}

pub fn ext(oid: ObjectIdentifier, critical: bool, value: Vec<u8>) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value).unwrap(),
    }
}

pub fn bc_ext(ca: bool, path_len_constraint: Option<u8>) -> Extension {
    let bc = BasicConstraints {
        ca,
        path_len_constraint,
    };
    ext(ID_CE_BASIC_CONSTRAINTS, true, bc.to_der().unwrap())
}

pub fn ca_key_usage_ext() -> Extension {
    let ku = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
    ext(ID_CE_KEY_USAGE, true, ku.to_der().unwrap())
}

pub fn policies_ext(oids: &[&str]) -> Extension {
    let infos = oids
        .iter()
        .map(|oid| PolicyInformation {
            policy_identifier: ObjectIdentifier::new_unwrap(oid),
            policy_qualifiers: None,
        })
        .collect();
    let cp = CertificatePolicies(infos);
    ext(ID_CE_CERTIFICATE_POLICIES, false, cp.to_der().unwrap())
}

pub fn policy_mappings_ext(mappings: &[(&str, &str)]) -> Extension {
    let pm = PolicyMappings(
        mappings
            .iter()
            .map(|(idp, sdp)| PolicyMapping {
                issuer_domain_policy: ObjectIdentifier::new_unwrap(idp),
                subject_domain_policy: ObjectIdentifier::new_unwrap(sdp),
            })
            .collect(),
    );
    ext(ID_CE_POLICY_MAPPINGS, false, pm.to_der().unwrap())
}

fn dns_subtree(domain: &str) -> GeneralSubtree {
    GeneralSubtree {
        base: GeneralName::DnsName(Ia5String::new(domain).unwrap()),
        minimum: 0,
        maximum: None,
    }
}

pub fn dns_name_constraints_ext(
    permitted: Option<&[&str]>,
    excluded: Option<&[&str]>,
) -> Extension {
    let nc = NameConstraints {
        permitted_subtrees: permitted.map(|v| v.iter().map(|d| dns_subtree(d)).collect()),
        excluded_subtrees: excluded.map(|v| v.iter().map(|d| dns_subtree(d)).collect()),
    };
    ext(ID_CE_NAME_CONSTRAINTS, true, nc.to_der().unwrap())
}

pub fn san_dns_ext(host: &str) -> Extension {
    let san = SubjectAltName(vec![GeneralName::DnsName(Ia5String::new(host).unwrap())]);
    ext(ID_CE_SUBJECT_ALT_NAME, false, san.to_der().unwrap())
}

pub fn crl_number_ext(number: &[u8]) -> Extension {
    let n = Uint::new(number).unwrap();
    ext(ID_CE_CRL_NUMBER, false, n.to_der().unwrap())
}

pub fn delta_crl_indicator_ext(base_number: &[u8]) -> Extension {
    let n = Uint::new(base_number).unwrap();
    ext(ID_CE_DELTA_CRL_INDICATOR, true, n.to_der().unwrap())
}

pub fn idp_only_some_reasons_ext(reasons: &[Reasons]) -> Extension {
    let mut flags = x509_cert::ext::pkix::crl::dp::ReasonFlags::default();
    for r in reasons {
        flags |= *r;
    }
    let idp = IssuingDistributionPoint {
        distribution_point: None,
        only_contains_user_certs: false,
        only_contains_ca_certs: false,
        only_some_reasons: Some(flags),
        indirect_crl: false,
        only_contains_attribute_certs: false,
    };
    ext(
        ID_CE_ISSUING_DISTRIBUTION_POINT,
        true,
        idp.to_der().unwrap(),
    )
}

pub fn revoked_entry(serial: u8, date: u64, reason: Option<CrlReason>) -> RevokedCert {
    let exts = reason.map(|r| {
        vec![ext(
            ID_CE_CRL_REASONS,
            false,
            r.to_der().unwrap(),
        )]
    });
    RevokedCert {
        serial_number: SerialNumber::new(&[serial]).unwrap(),
        revocation_date: utc(date),
        crl_entry_extensions: exts,
    }
}

pub fn build_crl(
    issuer: &str,
    this_update: u64,
    next_update: u64,
    revoked: Vec<RevokedCert>,
    exts: Vec<Extension>,
) -> Vec<u8> {
    let tbs = TbsCertList {
        version: Version::V2,
        signature: sig_alg(),
        issuer: Name::from_str(issuer).unwrap(),
        this_update: utc(this_update),
        next_update: Some(utc(next_update)),
        revoked_certificates: if revoked.is_empty() {
            None
        } else {
            Some(revoked)
        },
        crl_extensions: if exts.is_empty() { None } else { Some(exts) },
    };
    let crl = CertificateList {
        tbs_cert_list: tbs,
        signature_algorithm: sig_alg(),
        signature: BitString::from_bytes(&[0x5A; 8]).unwrap(),
    };
    crl.to_der().unwrap()
}
