//! CRL classification and processing
//!
//! Certificates are classified by basicConstraints and the presence of a CRL
//! distribution point; CRLs are classified by their issuingDistributionPoint
//! and deltaCRLIndicator extensions. A CRL is only consulted when its type is
//! compatible with the certificate type, its distribution point and issuer
//! check out, and it covers at least one reason code not yet accounted for by
//! the accumulated reasons mask.

use alloc::vec::Vec;

use core::cmp::Ordering;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_ISSUER,
    ID_CE_CRL_DISTRIBUTION_POINTS, ID_CE_CRL_NUMBER, ID_CE_CRL_REASONS,
    ID_CE_DELTA_CRL_INDICATOR, ID_CE_FRESHEST_CRL, ID_CE_HOLD_INSTRUCTION_CODE,
    ID_CE_INVALIDITY_DATE, ID_CE_ISSUING_DISTRIBUTION_POINT, ID_CE_KEY_USAGE,
};
use der::asn1::Uint;
use der::Decode;
use log::info;
use x509_cert::crl::{CertificateList, RevokedCert};
use x509_cert::ext::pkix::crl::dp::{DistributionPoint, ReasonFlags};
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName, GeneralNames};
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, CrlDistributionPoints, CrlReason, IssuingDistributionPoint, KeyUsages,
};
use x509_cert::ext::Extensions;
use x509_cert::name::Name;

use crate::environment::pki_environment::PkiEnvironment;
use crate::util::error::{Error, PathValidationStatus, Result};
use crate::util::name_utils::{compare_names, name_to_string};
use crate::util::validation_time::ValidationTime;
use crate::validator::parsed_cert::{CertExtension, ParsedCertificate, RawSigned};
use crate::validator::path_settings::{CertificationPathSettings, ValidityModel};

/// Revocation status of a single certificate
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CertStatus {
    /// No applicable CRL entry marks the certificate revoked
    Unrevoked,
    /// The certificate was revoked
    Revoked {
        /// Reason code from the CRL entry (Unspecified when absent)
        reason: CrlReason,
        /// Revocation date as seconds since the Unix epoch
        time: u64,
    },
}

/// Accumulates the reason codes for which revocation status has been
/// determined across one or more CRLs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ReasonsMask(pub ReasonFlags);

impl ReasonsMask {
    /// Returns an empty mask.
    pub fn none() -> Self {
        ReasonsMask(ReasonFlags::default())
    }

    /// Returns a mask covering every reason code.
    pub fn all() -> Self {
        ReasonsMask(ReasonFlags::full())
    }

    /// Returns true when every reason code is covered.
    pub fn is_all_reasons(&self) -> bool {
        self.0 == ReasonFlags::full()
    }

    /// Returns true when `interim` covers at least one reason code this mask
    /// does not.
    pub fn has_new_reasons(&self, interim: &ReasonsMask) -> bool {
        !(interim.0 & !self.0).is_empty()
    }

    /// Adds the reasons covered by `interim`.
    pub fn add(&mut self, interim: &ReasonsMask) {
        self.0 |= interim.0;
    }
}

/// Certificate classification with regard to applicable CRL types
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CertRevType {
    /// End entity certificate with a CRL distribution point
    EeDp,
    /// End entity certificate without a CRL distribution point
    Ee,
    /// CA certificate with a CRL distribution point
    CaDp,
    /// CA certificate without a CRL distribution point
    Ca,
}

/// CRL scope derived from issuingDistributionPoint and deltaCRLIndicator
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrlScope {
    /// Neither partitioned by a distribution point nor a delta
    Complete,
    /// Partitioned by a distribution point
    Dp,
    /// Delta CRL, not partitioned
    Delta,
    /// Delta CRL partitioned by a distribution point
    DeltaDp,
}

/// CRL coverage derived from the onlyContains flags of the
/// issuingDistributionPoint extension
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrlCoverage {
    /// Entries for all entity types
    All,
    /// Entries for end entity certificates only
    EeOnly,
    /// Entries for CA certificates only
    CaOnly,
}

/// CRL authority derived from the indirectCRL flag
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrlAuthority {
    /// Entries were issued by the CRL issuer
    Direct,
    /// Entries may name certificates from other issuers
    Indirect,
}

/// Classification of a CRL derived from its extensions
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CrlType {
    /// Scope relative to distribution point partitioning and deltas
    pub scope: CrlScope,
    /// Entity types covered
    pub coverage: CrlCoverage,
    /// Direct or indirect
    pub authority: CrlAuthority,
}

/// Parsed classification data for one CRL
#[derive(Clone)]
pub struct CrlInfo {
    /// Classification of the CRL
    pub type_info: CrlType,
    /// thisUpdate as seconds since the Unix epoch
    pub this_update: u64,
    /// nextUpdate as seconds since the Unix epoch, when present
    pub next_update: Option<u64>,
    /// Decoded issuingDistributionPoint, when present
    pub idp: Option<IssuingDistributionPoint>,
    /// Raw issuingDistributionPoint value for delta matching
    pub idp_blob: Option<Vec<u8>>,
    /// Key identifier from the authorityKeyIdentifier extension
    pub aki: Option<Vec<u8>>,
    /// cRLNumber value as unsigned big-endian bytes
    pub crl_number: Option<Vec<u8>>,
    /// BaseCRLNumber from the deltaCRLIndicator extension
    pub base_crl_number: Option<Vec<u8>>,
}

impl CrlInfo {
    /// Returns true when the CRL is a delta CRL.
    pub fn is_delta(&self) -> bool {
        self.base_crl_number.is_some()
    }
}

/// `classify_certificate` returns the [`CertRevType`] for a certificate based
/// on basicConstraints and the presence of a CRL distribution point.
pub fn classify_certificate(cert: &ParsedCertificate) -> CertRevType {
    let is_ca = matches!(
        cert.extension(&ID_CE_BASIC_CONSTRAINTS),
        Some(CertExtension::BasicConstraints(bc)) if bc.ca
    );
    let has_crldp = cert.extension(&ID_CE_CRL_DISTRIBUTION_POINTS).is_some();
    match (is_ca, has_crldp) {
        (true, true) => CertRevType::CaDp,
        (true, false) => CertRevType::Ca,
        (false, true) => CertRevType::EeDp,
        (false, false) => CertRevType::Ee,
    }
}

fn scope_compatible(cert_type: CertRevType, scope: CrlScope) -> bool {
    match cert_type {
        // certificates without a distribution point only take complete or
        // delta CRLs
        CertRevType::Ee | CertRevType::Ca => {
            matches!(scope, CrlScope::Complete | CrlScope::Delta)
        }
        CertRevType::EeDp | CertRevType::CaDp => true,
    }
}

fn coverage_compatible(cert_type: CertRevType, coverage: CrlCoverage) -> bool {
    match coverage {
        CrlCoverage::All => true,
        CrlCoverage::EeOnly => matches!(cert_type, CertRevType::Ee | CertRevType::EeDp),
        CrlCoverage::CaOnly => matches!(cert_type, CertRevType::Ca | CertRevType::CaDp),
    }
}

/// `get_crl_info` classifies a CRL by inspecting its extensions. CRLs that
/// are limited to attribute certificates or that use a distribution point
/// name expressed relative to the issuer are rejected.
pub fn get_crl_info(crl: &CertificateList) -> Result<CrlInfo> {
    let this_update = crl.tbs_cert_list.this_update.to_unix_duration().as_secs();
    let next_update = crl
        .tbs_cert_list
        .next_update
        .map(|nu| nu.to_unix_duration().as_secs());

    let mut idp: Option<IssuingDistributionPoint> = None;
    let mut idp_blob: Option<Vec<u8>> = None;
    let mut aki: Option<Vec<u8>> = None;
    let mut crl_number: Option<Vec<u8>> = None;
    let mut base_crl_number: Option<Vec<u8>> = None;

    if let Some(exts) = &crl.tbs_cert_list.crl_extensions {
        for ext in exts.iter() {
            match ext.extn_id {
                ID_CE_ISSUING_DISTRIBUTION_POINT => {
                    let decoded = IssuingDistributionPoint::from_der(ext.extn_value.as_bytes())?;
                    if let Some(DistributionPointName::NameRelativeToCRLIssuer(_)) =
                        &decoded.distribution_point
                    {
                        return Err(Error::UnsupportedDistributionPointName);
                    }
                    idp_blob = Some(ext.extn_value.as_bytes().to_vec());
                    idp = Some(decoded);
                }
                ID_CE_AUTHORITY_KEY_IDENTIFIER => {
                    let akid = AuthorityKeyIdentifier::from_der(ext.extn_value.as_bytes())?;
                    if let Some(kid) = akid.key_identifier {
                        aki = Some(kid.as_bytes().to_vec());
                    }
                }
                ID_CE_CRL_NUMBER => {
                    let number = Uint::from_der(ext.extn_value.as_bytes())?;
                    crl_number = Some(number.as_bytes().to_vec());
                }
                ID_CE_DELTA_CRL_INDICATOR => {
                    let number = Uint::from_der(ext.extn_value.as_bytes())?;
                    base_crl_number = Some(number.as_bytes().to_vec());
                }
                _ => {}
            }
        }
    }

    let mut coverage = CrlCoverage::All;
    let mut authority = CrlAuthority::Direct;
    let mut partitioned = false;
    if let Some(idp) = &idp {
        if idp.only_contains_attribute_certs {
            return Err(Error::CrlIncompatible);
        }
        if idp.only_contains_user_certs {
            coverage = CrlCoverage::EeOnly;
        } else if idp.only_contains_ca_certs {
            coverage = CrlCoverage::CaOnly;
        }
        if idp.indirect_crl {
            authority = CrlAuthority::Indirect;
        }
        partitioned = idp.distribution_point.is_some();
    }

    let scope = match (partitioned, base_crl_number.is_some()) {
        (false, false) => CrlScope::Complete,
        (true, false) => CrlScope::Dp,
        (false, true) => CrlScope::Delta,
        (true, true) => CrlScope::DeltaDp,
    };

    Ok(CrlInfo {
        type_info: CrlType {
            scope,
            coverage,
            authority,
        },
        this_update,
        next_update,
        idp,
        idp_blob,
        aki,
        crl_number,
        base_crl_number,
    })
}

fn crl_dps(cert: &ParsedCertificate) -> Option<&CrlDistributionPoints> {
    match cert.extension(&ID_CE_CRL_DISTRIBUTION_POINTS) {
        Some(CertExtension::CrlDistributionPoints(dps)) => Some(dps),
        _ => None,
    }
}

/// `validate_crl_issuer_name` confirms the CRL issuer matches either the
/// certificate issuer or a crlIssuer value from a distribution point. The
/// matching distribution point, when one produced the match, becomes the
/// active distribution point for subsequent checks.
fn validate_crl_issuer_name(
    cert: &ParsedCertificate,
    crl_issuer: &Name,
) -> Result<Option<DistributionPoint>> {
    if let Some(dps) = crl_dps(cert) {
        for dp in &dps.0 {
            if let Some(gns) = &dp.crl_issuer {
                for gn in gns {
                    if let GeneralName::DirectoryName(dn) = gn {
                        if compare_names(dn, crl_issuer) {
                            return Ok(Some(dp.clone()));
                        }
                    }
                }
            }
        }
    }
    if compare_names(&cert.cert.tbs_certificate.issuer, crl_issuer) {
        return Ok(None);
    }
    Err(Error::CrlIncompatible)
}

fn general_names_intersect(lhs: &GeneralNames, rhs: &GeneralNames) -> bool {
    rhs.iter().any(|gn| lhs.contains(gn))
}

/// `validate_distribution_point` confirms a partitioned CRL applies to the
/// certificate and computes the interim reasons mask: the intersection of the
/// reasons from the active distribution point and the onlySomeReasons field
/// of the issuingDistributionPoint, with an absent field meaning all reasons.
fn validate_distribution_point(
    cert: &ParsedCertificate,
    cert_type: CertRevType,
    crl_issuer: &Name,
    crl_info: &CrlInfo,
) -> Result<ReasonsMask> {
    let active_dp = validate_crl_issuer_name(cert, crl_issuer)?;

    if matches!(crl_info.type_info.scope, CrlScope::Dp | CrlScope::DeltaDp) {
        let idp = crl_info.idp.as_ref().ok_or(Error::CrlIncompatible)?;
        let gns_from_idp = match &idp.distribution_point {
            Some(DistributionPointName::FullName(gns)) => gns,
            _ => return Err(Error::UnsupportedDistributionPointName),
        };

        let mut found_match = false;
        if let Some(dp) = &active_dp {
            if let Some(DistributionPointName::FullName(gns_from_dp)) = &dp.distribution_point {
                found_match = general_names_intersect(gns_from_dp, gns_from_idp);
            }
        } else if let Some(dps) = crl_dps(cert) {
            for dp in &dps.0 {
                if let Some(DistributionPointName::FullName(gns_from_dp)) = &dp.distribution_point {
                    if general_names_intersect(gns_from_dp, gns_from_idp) {
                        found_match = true;
                        break;
                    }
                }
            }
        }
        if !found_match {
            return Err(Error::CrlIncompatible);
        }
    }

    if let Some(idp) = &crl_info.idp {
        if idp.only_contains_ca_certs && !coverage_compatible(cert_type, CrlCoverage::CaOnly) {
            return Err(Error::CrlIncompatible);
        }
        if idp.only_contains_user_certs && !coverage_compatible(cert_type, CrlCoverage::EeOnly) {
            return Err(Error::CrlIncompatible);
        }
    }

    // interim mask per RFC 5280 6.3.3 (d)
    let dp_reasons = active_dp
        .as_ref()
        .and_then(|dp| dp.reasons)
        .unwrap_or_else(ReasonFlags::full);
    let idp_reasons = crl_info
        .idp
        .as_ref()
        .and_then(|idp| idp.only_some_reasons)
        .unwrap_or_else(ReasonFlags::full);
    let interim = dp_reasons & idp_reasons;
    if interim.is_empty() {
        return Err(Error::CrlIncompatible);
    }
    Ok(ReasonsMask(interim))
}

/// `validate_crl_authority` confirms that a CRL issued by other than the
/// certificate issuer asserts indirectCRL.
fn validate_crl_authority(
    cert: &ParsedCertificate,
    crl_issuer: &Name,
    crl_info: &CrlInfo,
) -> Result<()> {
    if !compare_names(&cert.cert.tbs_certificate.issuer, crl_issuer)
        && CrlAuthority::Indirect != crl_info.type_info.authority
    {
        return Err(Error::CrlIncompatible);
    }
    Ok(())
}

/// `verify_crl` confirms the CRL signature with the issuer public key and
/// that the issuer asserts cRLSign when a keyUsage extension is present.
pub fn verify_crl(
    pe: &PkiEnvironment,
    crl_buf: &[u8],
    issuer_cert: &ParsedCertificate,
) -> Result<()> {
    if let Some(CertExtension::KeyUsage(ku)) = issuer_cert.extension(&ID_CE_KEY_USAGE) {
        if !ku.0.contains(KeyUsages::CRLSign) {
            return Err(Error::PathValidation(PathValidationStatus::InvalidKeyUsage));
        }
    }

    let defer_crl = RawSigned::from_der(crl_buf)?;
    let signature = defer_crl
        .signature
        .as_bytes()
        .ok_or(Error::PathValidation(PathValidationStatus::EncodingError))?;
    pe.verify_signature_message(
        pe,
        &defer_crl.tbs,
        signature,
        &defer_crl.signature_algorithm,
        &issuer_cert.cert.tbs_certificate.subject_public_key_info,
    )
    .map_err(|_| {
        Error::PathValidation(PathValidationStatus::SignatureVerificationFailure)
    })
}

/// `check_crl_validity` confirms the evaluation time falls within the
/// thisUpdate/nextUpdate window. Under the default validity model a CRL
/// issued after the certificate expired is also rejected.
pub fn check_crl_validity(
    cps: &CertificationPathSettings,
    cert: &ParsedCertificate,
    crl_info: &CrlInfo,
) -> Result<()> {
    let toi = cps.time_of_interest;
    if toi.is_disabled() {
        return Ok(());
    }
    let toi_secs = toi.as_unix_secs();
    if crl_info.this_update > toi_secs {
        return Err(Error::CrlStale);
    }
    if let Some(nu) = crl_info.next_update {
        if nu < toi_secs {
            return Err(Error::CrlStale);
        }
    }
    if ValidityModel::PkixDefault == cps.validity_model {
        let not_after = cert
            .cert
            .tbs_certificate
            .validity
            .not_after
            .to_unix_duration()
            .as_secs();
        if crl_info.this_update > not_after {
            return Err(Error::CrlStale);
        }
    }
    Ok(())
}

/// `check_crl_extensions` rejects CRLs with a critical extension outside the
/// set this implementation processes.
pub fn check_crl_extensions(exts: &Extensions) -> Result<()> {
    let supported = [
        ID_CE_ISSUING_DISTRIBUTION_POINT,
        ID_CE_DELTA_CRL_INDICATOR,
        ID_CE_FRESHEST_CRL,
        ID_CE_CRL_NUMBER,
        ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ];
    for e in exts {
        if e.critical && !supported.contains(&e.extn_id) {
            return Err(Error::UnsupportedCrlExtension);
        }
    }
    Ok(())
}

/// `check_entry_extensions` rejects a matching CRL entry with a critical
/// extension outside the set this implementation processes. Invalidity date
/// and hold instruction values are informational.
pub fn check_entry_extensions(rc: &RevokedCert) -> Result<()> {
    let supported = [
        ID_CE_INVALIDITY_DATE,
        ID_CE_CRL_REASONS,
        ID_CE_HOLD_INSTRUCTION_CODE,
        ID_CE_CERTIFICATE_ISSUER,
    ];
    if let Some(exts) = &rc.crl_entry_extensions {
        for e in exts {
            if e.critical && !supported.contains(&e.extn_id) {
                return Err(Error::UnsupportedCrlEntryExtension);
            }
        }
    }
    Ok(())
}

fn entry_reason(rc: &RevokedCert) -> CrlReason {
    if let Some(exts) = &rc.crl_entry_extensions {
        for e in exts {
            if e.extn_id == ID_CE_CRL_REASONS {
                if let Ok(reason) = CrlReason::from_der(e.extn_value.as_bytes()) {
                    return reason;
                }
            }
        }
    }
    CrlReason::Unspecified
}

fn entry_certificate_issuer(rc: &RevokedCert) -> Option<Name> {
    if let Some(exts) = &rc.crl_entry_extensions {
        for e in exts {
            if e.extn_id == ID_CE_CERTIFICATE_ISSUER {
                if let Ok(gns) = GeneralNames::from_der(e.extn_value.as_bytes()) {
                    for gn in gns {
                        if let GeneralName::DirectoryName(dn) = gn {
                            return Some(dn);
                        }
                    }
                }
            }
        }
    }
    None
}

// reasons that apply retroactively: a matching entry revokes the certificate
// even when the recorded revocation date is later than the evaluation time
fn reason_is_retroactive(reason: CrlReason) -> bool {
    matches!(
        reason,
        CrlReason::Unspecified
            | CrlReason::KeyCompromise
            | CrlReason::CaCompromise
            | CrlReason::RemoveFromCRL
    )
}

/// `search_revocations` scans CRL entries for the certificate, honoring the
/// certificateIssuer entry extension, which changes the effective entry
/// issuer for the remainder of the list in an indirect CRL. A removeFromCRL
/// entry resets the status to unrevoked (meaningful when scanning a delta).
/// Returns true when an entry for the certificate was found.
pub fn search_revocations(
    crl: &CertificateList,
    cert: &ParsedCertificate,
    toi: ValidationTime,
    status: &mut CertStatus,
) -> Result<bool> {
    let revoked = match &crl.tbs_cert_list.revoked_certificates {
        Some(revoked) => revoked,
        None => return Ok(false),
    };
    let cert_issuer = &cert.cert.tbs_certificate.issuer;
    let mut entry_issuer = crl.tbs_cert_list.issuer.clone();
    for rc in revoked {
        if let Some(issuer) = entry_certificate_issuer(rc) {
            entry_issuer = issuer;
        }
        if rc.serial_number != cert.cert.tbs_certificate.serial_number
            || !compare_names(&entry_issuer, cert_issuer)
        {
            continue;
        }
        check_entry_extensions(rc)?;

        let reason = entry_reason(rc);
        let revocation_time = rc.revocation_date.to_unix_duration().as_secs();
        if !toi.is_disabled()
            && revocation_time > toi.as_unix_secs()
            && !reason_is_retroactive(reason)
        {
            continue;
        }
        if CrlReason::RemoveFromCRL == reason {
            *status = CertStatus::Unrevoked;
        } else {
            *status = CertStatus::Revoked {
                reason,
                time: revocation_time,
            };
        }
        return Ok(true);
    }
    Ok(false)
}

fn cmp_uint(lhs: &[u8], rhs: &[u8]) -> Ordering {
    let lhs = strip_leading_zeros(lhs);
    let rhs = strip_leading_zeros(rhs);
    match lhs.len().cmp(&rhs.len()) {
        Ordering::Equal => lhs.cmp(rhs),
        other => other,
    }
}

fn strip_leading_zeros(v: &[u8]) -> &[u8] {
    let mut v = v;
    while let Some((0, rest)) = v.split_first() {
        v = rest;
    }
    v
}

/// `delta_matches_base` confirms a delta CRL applies to a base CRL: same
/// issuer, identical issuingDistributionPoint, same authority key identifier,
/// and a BaseCRLNumber no greater than the base's cRLNumber.
pub fn delta_matches_base(
    base: &CertificateList,
    base_info: &CrlInfo,
    delta: &CertificateList,
    delta_info: &CrlInfo,
) -> bool {
    let base_number = match (&delta_info.base_crl_number, &base_info.crl_number) {
        (Some(indicated), Some(number)) => cmp_uint(indicated, number) != Ordering::Greater,
        _ => false,
    };
    base_number
        && compare_names(&base.tbs_cert_list.issuer, &delta.tbs_cert_list.issuer)
        && base_info.idp_blob == delta_info.idp_blob
        && base_info.aki == delta_info.aki
}

/// `process_crl` evaluates one complete CRL (with an optional matching delta)
/// against a certificate. On success the interim reasons mask is folded into
/// `reasons_mask` and `status` reflects any revocation notification found,
/// with the delta consulted ahead of the base.
#[allow(clippy::too_many_arguments)]
pub fn process_crl(
    pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cert: &ParsedCertificate,
    issuer_cert: &ParsedCertificate,
    crl_buf: &[u8],
    crl: &CertificateList,
    delta: Option<(&[u8], &CertificateList, &CrlInfo)>,
    reasons_mask: &mut ReasonsMask,
    status: &mut CertStatus,
) -> Result<()> {
    let crl_info = get_crl_info(crl)?;
    if crl_info.is_delta() {
        // deltas are only applied alongside their base
        return Err(Error::CrlIncompatible);
    }

    let cert_type = classify_certificate(cert);
    if !scope_compatible(cert_type, crl_info.type_info.scope)
        || !coverage_compatible(cert_type, crl_info.type_info.coverage)
    {
        info!(
            "Discarding CRL from {} as having incompatible scope or coverage",
            name_to_string(&crl.tbs_cert_list.issuer)
        );
        return Err(Error::CrlIncompatible);
    }

    let crl_issuer = &crl.tbs_cert_list.issuer;
    let interim = validate_distribution_point(cert, cert_type, crl_issuer, &crl_info)?;
    if !reasons_mask.has_new_reasons(&interim) {
        // nothing new to learn from this CRL
        return Err(Error::CrlIncompatible);
    }
    validate_crl_authority(cert, crl_issuer, &crl_info)?;

    verify_crl(pe, crl_buf, issuer_cert)?;
    check_crl_validity(cps, cert, &crl_info)?;
    if let Some(exts) = &crl.tbs_cert_list.crl_extensions {
        check_crl_extensions(exts)?;
    }

    // an entry in the delta, including removeFromCRL, supersedes the base
    let mut found = false;
    if let Some((delta_buf, delta_crl, delta_info)) = delta {
        verify_crl(pe, delta_buf, issuer_cert)?;
        check_crl_validity(cps, cert, delta_info)?;
        if let Some(exts) = &delta_crl.tbs_cert_list.crl_extensions {
            check_crl_extensions(exts)?;
        }
        found = search_revocations(delta_crl, cert, cps.time_of_interest, status)?;
    }
    if !found {
        search_revocations(crl, cert, cps.time_of_interest, status)?;
    }

    reasons_mask.add(&interim);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_cert::ext::pkix::crl::dp::Reasons;

    #[test]
    fn reasons_mask_accumulation() {
        let mut mask = ReasonsMask::none();
        assert!(!mask.is_all_reasons());
        let interim = ReasonsMask(Reasons::KeyCompromise | Reasons::CaCompromise);
        assert!(mask.has_new_reasons(&interim));
        mask.add(&interim);
        assert!(!mask.has_new_reasons(&interim));
        assert!(!mask.is_all_reasons());
        mask.add(&ReasonsMask::all());
        assert!(mask.is_all_reasons());
    }

    #[test]
    fn uint_comparison() {
        assert_eq!(Ordering::Equal, cmp_uint(&[0, 5], &[5]));
        assert_eq!(Ordering::Less, cmp_uint(&[4], &[1, 0]));
        assert_eq!(Ordering::Greater, cmp_uint(&[2, 0], &[5]));
        assert_eq!(Ordering::Less, cmp_uint(&[], &[1]));
    }

    #[test]
    fn retroactive_reasons() {
        assert!(reason_is_retroactive(CrlReason::KeyCompromise));
        assert!(reason_is_retroactive(CrlReason::CaCompromise));
        assert!(reason_is_retroactive(CrlReason::Unspecified));
        assert!(reason_is_retroactive(CrlReason::RemoveFromCRL));
        assert!(!reason_is_retroactive(CrlReason::Superseded));
        assert!(!reason_is_retroactive(CrlReason::CertificateHold));
    }
}
