//! Revocation status determination scenarios using in-memory CRL stores

#![cfg(feature = "revocation")]

mod common;

use common::*;

use der::Decode;
use x509_cert::crl::CertificateList;
use x509_cert::ext::pkix::crl::dp::Reasons;
use x509_cert::ext::pkix::crl::CrlReason;

use pkipath::{
    CertificationPath, CertificationPathResults, CrlSource, CrlSourceMap, Error, ParsedCertificate,
    PathValidationStatus,
};

fn root_and_ee() -> (ParsedCertificate, ParsedCertificate) {
    let root = build_cert(
        "CN=Root",
        "CN=Root",
        1,
        vec![bc_ext(true, None), ca_key_usage_ext()],
    );
    let ee = build_cert("CN=EE", "CN=Root", 7, vec![]);
    (root, ee)
}

fn store_with(crl_bufs: &[Vec<u8>]) -> CrlSourceMap {
    let store = CrlSourceMap::new();
    for buf in crl_bufs {
        let crl = CertificateList::from_der(buf).unwrap();
        store.add_crl(buf, &crl).unwrap();
    }
    store
}

fn revocation_settings() -> pkipath::CertificationPathSettings {
    let mut cps = test_settings();
    cps.check_revocation_status = true;
    cps
}

#[test]
fn unrevoked_with_complete_crl() {
    let mut pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let crl = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![],
        vec![crl_number_ext(&[1])],
    );
    pe.add_crl_source(Box::new(store_with(&[crl])));

    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert!(pe.validate_path(&pe, &cps, &mut cp, &mut cpr).is_ok());
    assert_eq!(PathValidationStatus::Valid, cpr.validation_status());
    assert_eq!(1, cpr.crls_used().len());
}

#[test]
fn revoked_for_key_compromise() {
    let mut pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let crl = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![revoked_entry(
            7,
            TOI - 50_000,
            Some(CrlReason::KeyCompromise),
        )],
        vec![crl_number_ext(&[1])],
    );
    pe.add_crl_source(Box::new(store_with(&[crl])));

    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::CertificateRevoked {
                reason: CrlReason::KeyCompromise,
                time: TOI - 50_000,
            }
        )),
        pe.validate_path(&pe, &cps, &mut cp, &mut cpr)
    );
    assert_eq!(Some(0), cpr.failing_certificate_index());
}

#[test]
fn no_crl_available() {
    let pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::RevocationStatusNotDetermined
        )),
        pe.validate_path(&pe, &cps, &mut cp, &mut cpr)
    );
}

#[test]
fn partial_reasons_coverage_is_undetermined() {
    // the only available CRL scopes itself to keyCompromise, leaving the
    // remaining reason codes uncovered
    let mut pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let crl = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![],
        vec![
            crl_number_ext(&[1]),
            idp_only_some_reasons_ext(&[Reasons::KeyCompromise]),
        ],
    );
    pe.add_crl_source(Box::new(store_with(&[crl])));

    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::RevocationStatusNotDetermined
        )),
        pe.validate_path(&pe, &cps, &mut cp, &mut cpr)
    );
}

#[test]
fn stapled_crl_satisfies_check() {
    let pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let crl = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![],
        vec![crl_number_ext(&[1])],
    );

    let mut cp = CertificationPath::new(root, vec![], ee);
    cp.staple_crl(0, crl);
    let mut cpr = CertificationPathResults::default();
    assert!(pe.validate_path(&pe, &cps, &mut cp, &mut cpr).is_ok());
    assert_eq!(1, cpr.crls_used().len());
}

#[test]
fn delta_lifts_certificate_hold() {
    let mut pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let base = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![revoked_entry(
            7,
            TOI - 80_000,
            Some(CrlReason::CertificateHold),
        )],
        vec![crl_number_ext(&[1])],
    );
    let delta = build_crl(
        "CN=Root",
        TOI - 50_000,
        TOI + 100_000,
        vec![revoked_entry(
            7,
            TOI - 60_000,
            Some(CrlReason::RemoveFromCRL),
        )],
        vec![crl_number_ext(&[2]), delta_crl_indicator_ext(&[1])],
    );
    pe.add_crl_source(Box::new(store_with(&[base, delta])));

    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert!(pe.validate_path(&pe, &cps, &mut cp, &mut cpr).is_ok());
    // base and delta both contributed to the determination
    assert_eq!(2, cpr.crls_used().len());
}

#[test]
fn delta_ignored_when_disabled() {
    let mut pe = test_environment();
    let mut cps = revocation_settings();
    cps.use_deltas = false;
    let (root, ee) = root_and_ee();

    let base = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![revoked_entry(
            7,
            TOI - 80_000,
            Some(CrlReason::CertificateHold),
        )],
        vec![crl_number_ext(&[1])],
    );
    let delta = build_crl(
        "CN=Root",
        TOI - 50_000,
        TOI + 100_000,
        vec![revoked_entry(
            7,
            TOI - 60_000,
            Some(CrlReason::RemoveFromCRL),
        )],
        vec![crl_number_ext(&[2]), delta_crl_indicator_ext(&[1])],
    );
    pe.add_crl_source(Box::new(store_with(&[base, delta])));

    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::CertificateRevoked {
                reason: CrlReason::CertificateHold,
                time: TOI - 80_000,
            }
        )),
        pe.validate_path(&pe, &cps, &mut cp, &mut cpr)
    );
}

#[test]
fn future_revocation_dates() {
    // a revocation dated after the evaluation time applies only for
    // retroactive reasons such as keyCompromise
    let mut pe = test_environment();
    let cps = revocation_settings();
    let (root, ee) = root_and_ee();

    let superseded = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![revoked_entry(7, TOI + 50_000, Some(CrlReason::Superseded))],
        vec![crl_number_ext(&[1])],
    );
    pe.add_crl_source(Box::new(store_with(&[superseded])));

    let (root2, ee2) = root_and_ee();
    let mut cp = CertificationPath::new(root, vec![], ee);
    let mut cpr = CertificationPathResults::default();
    assert!(pe.validate_path(&pe, &cps, &mut cp, &mut cpr).is_ok());

    let mut pe2 = test_environment();
    let compromised = build_crl(
        "CN=Root",
        TOI - 100_000,
        TOI + 100_000,
        vec![revoked_entry(
            7,
            TOI + 50_000,
            Some(CrlReason::KeyCompromise),
        )],
        vec![crl_number_ext(&[1])],
    );
    pe2.add_crl_source(Box::new(store_with(&[compromised])));

    let mut cp2 = CertificationPath::new(root2, vec![], ee2);
    let mut cpr2 = CertificationPathResults::default();
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::CertificateRevoked {
                reason: CrlReason::KeyCompromise,
                time: TOI + 50_000,
            }
        )),
        pe2.validate_path(&pe2, &cps, &mut cp2, &mut cpr2)
    );
}
