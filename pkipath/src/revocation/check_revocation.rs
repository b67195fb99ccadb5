//! Revocation status determination for each certificate in a path
//!
//! For every certificate below the trust anchor, CRLs are gathered from any
//! stapled value on the path and from the CRL sources in the environment.
//! Complete CRLs are evaluated one at a time, each paired with the freshest
//! applicable delta when delta processing is enabled, until either a
//! revocation notification is found, all reason codes are covered, or the
//! candidates are exhausted. A certificate with no valid CRL, or whose CRLs
//! cover only some reason codes, fails with an undetermined status rather
//! than passing silently.

use alloc::vec::Vec;

use der::Decode;
use log::info;
use x509_cert::crl::CertificateList;

use crate::environment::pki_environment::PkiEnvironment;
use crate::revocation::crl::{
    delta_matches_base, get_crl_info, process_crl, CertStatus, CrlInfo, ReasonsMask,
};
use crate::util::error::{Error, PathValidationStatus, Result};
use crate::util::name_utils::name_to_string;
use crate::validator::{
    CertificationPath, CertificationPathResults, CertificationPathSettings, ParsedCertificate,
};

struct CandidateCrl {
    buf: Vec<u8>,
    crl: CertificateList,
    info: CrlInfo,
}

/// Collects parseable CRLs for a certificate from the stapled slot and the
/// environment, split into complete CRLs and deltas. Unparseable or plainly
/// unusable CRLs are dropped here rather than failing the whole check.
fn gather_candidates(
    pe: &PkiEnvironment,
    stapled: Option<&Vec<u8>>,
    cert: &ParsedCertificate,
) -> (Vec<CandidateCrl>, Vec<CandidateCrl>) {
    let mut bufs: Vec<Vec<u8>> = Vec::new();
    if let Some(crl_buf) = stapled {
        bufs.push(crl_buf.clone());
    }
    if let Ok(crls) = pe.get_crls(cert) {
        bufs.extend(crls);
    }

    let mut completes = Vec::new();
    let mut deltas = Vec::new();
    for buf in bufs {
        let crl = match CertificateList::from_der(&buf) {
            Ok(crl) => crl,
            Err(_) => {
                info!("Discarding CRL that failed to parse");
                continue;
            }
        };
        let info = match get_crl_info(&crl) {
            Ok(info) => info,
            Err(_) => continue,
        };
        let candidate = CandidateCrl { buf, crl, info };
        if candidate.info.is_delta() {
            deltas.push(candidate);
        } else {
            completes.push(candidate);
        }
    }
    (completes, deltas)
}

/// Returns the freshest delta that applies to the given base CRL, requiring
/// the delta's thisUpdate to be no earlier than the base's.
fn find_delta<'a>(base: &CandidateCrl, deltas: &'a [CandidateCrl]) -> Option<&'a CandidateCrl> {
    deltas
        .iter()
        .filter(|d| {
            d.info.this_update >= base.info.this_update
                && delta_matches_base(&base.crl, &base.info, &d.crl, &d.info)
        })
        .max_by_key(|d| d.info.this_update)
}

/// `check_revocation` determines the revocation status of every certificate
/// below the trust anchor using CRLs. CRLs that contribute to a determination
/// are recorded in the results. Fails with CertificateRevoked when a
/// notification is found and with RevocationStatusNotDetermined when no valid
/// CRL covers a certificate.
pub fn check_revocation(
    pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let count = cp.intermediates.len() + 1;
    for pos in 0..count {
        let cert = if pos < cp.intermediates.len() {
            &cp.intermediates[pos]
        } else {
            &cp.target
        };
        let issuer_cert = if pos == 0 {
            &cp.trust_anchor
        } else {
            &cp.intermediates[pos - 1]
        };

        let (completes, deltas) = gather_candidates(pe, cp.crls.get(pos).and_then(Option::as_ref), cert);

        let mut status = CertStatus::Unrevoked;
        let mut reasons_mask = ReasonsMask::none();
        let mut determined = false;
        let mut last_err = None;
        for candidate in &completes {
            if CertStatus::Unrevoked != status || reasons_mask.is_all_reasons() {
                break;
            }
            let delta = if cps.use_deltas {
                find_delta(candidate, &deltas)
            } else {
                None
            };
            match process_crl(
                pe,
                cps,
                cert,
                issuer_cert,
                &candidate.buf,
                &candidate.crl,
                delta.map(|d| (d.buf.as_slice(), &d.crl, &d.info)),
                &mut reasons_mask,
                &mut status,
            ) {
                Ok(()) => {
                    determined = true;
                    cpr.add_crl_used(candidate.buf.clone());
                    if let Some(d) = delta {
                        cpr.add_crl_used(d.buf.clone());
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }

        // an unrevoked result only counts when every reason code was covered
        if determined && CertStatus::Unrevoked == status && !reasons_mask.is_all_reasons() {
            info!(
                "CRLs for certificate from {} cover only some reason codes",
                name_to_string(&cert.cert.tbs_certificate.subject)
            );
            determined = false;
        }

        if let CertStatus::Revoked { reason, time } = status {
            info!(
                "Certificate from {} is revoked",
                name_to_string(&cert.cert.tbs_certificate.subject)
            );
            cpr.set_failing_certificate_index(pos);
            return Err(Error::PathValidation(
                PathValidationStatus::CertificateRevoked { reason, time },
            ));
        }
        if !determined {
            if let Some(e) = last_err {
                info!(
                    "No valid CRL for certificate from {}: {}",
                    name_to_string(&cert.cert.tbs_certificate.subject),
                    e
                );
            }
            cpr.set_failing_certificate_index(pos);
            return Err(Error::PathValidation(
                PathValidationStatus::RevocationStatusNotDetermined,
            ));
        }
    }
    Ok(())
}
