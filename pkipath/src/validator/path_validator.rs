//! Certification path validation per RFC 5280 section 6.1
//!
//! [`validate_path_rfc5280`] runs each check in turn over a
//! [`CertificationPath`]: name chaining and name constraints, validity,
//! signatures, basic constraints, key usage, certificate policies, extended
//! key usage, critical extension accounting and, when enabled, revocation
//! status. Checks are separate functions so callers can compose a subset.

use alloc::vec::Vec;

use const_oid::db::rfc5280::ANY_POLICY;
use const_oid::db::rfc5912::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES, ID_CE_EXT_KEY_USAGE,
    ID_CE_INHIBIT_ANY_POLICY, ID_CE_KEY_USAGE, ID_CE_NAME_CONSTRAINTS, ID_CE_POLICY_CONSTRAINTS,
    ID_CE_POLICY_MAPPINGS, ID_CE_SUBJECT_ALT_NAME,
};
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix::{
    BasicConstraints, CertificatePolicies, ExtendedKeyUsage, InhibitAnyPolicy, KeyUsage, KeyUsages,
    NameConstraints, PolicyConstraints, PolicyMappings, SubjectAltName,
};

use crate::environment::pki_environment::PkiEnvironment;
use crate::util::cert_utils::{cert_generation_time, log_error_for_name, valid_at_time};
use crate::util::error::{Error, PathValidationStatus, Result};
use crate::util::name_utils::is_self_issued;
use crate::validator::cert_path::CertificationPath;
use crate::validator::name_constraints_set::NameConstraintsState;
use crate::validator::parsed_cert::{CertExtension, ParsedCertificate, RawSigned, EXTS_OF_INTEREST};
use crate::validator::path_results::CertificationPathResults;
use crate::validator::path_settings::{
    CertificationPathSettings, ObjectIdentifierSet, ValidityModel, MAX_PATH_LENGTH_CONSTRAINT,
};
use crate::validator::policy_tree::{GroupedMappings, PolicyTree};

/// anyExtendedKeyUsage from RFC 5280 section 4.2.1.12
pub const ANY_EXTENDED_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37.0");

fn status_err(status: PathValidationStatus) -> Error {
    Error::PathValidation(status)
}

fn basic_constraints(cert: &ParsedCertificate) -> Option<&BasicConstraints> {
    match cert.extension(&ID_CE_BASIC_CONSTRAINTS) {
        Some(CertExtension::BasicConstraints(bc)) => Some(bc),
        _ => None,
    }
}

fn key_usage(cert: &ParsedCertificate) -> Option<&KeyUsage> {
    match cert.extension(&ID_CE_KEY_USAGE) {
        Some(CertExtension::KeyUsage(ku)) => Some(ku),
        _ => None,
    }
}

fn subject_alt_name(cert: &ParsedCertificate) -> Option<&SubjectAltName> {
    match cert.extension(&ID_CE_SUBJECT_ALT_NAME) {
        Some(CertExtension::SubjectAltName(san)) => Some(san),
        _ => None,
    }
}

fn name_constraints(cert: &ParsedCertificate) -> Option<&NameConstraints> {
    match cert.extension(&ID_CE_NAME_CONSTRAINTS) {
        Some(CertExtension::NameConstraints(nc)) => Some(nc),
        _ => None,
    }
}

fn certificate_policies(cert: &ParsedCertificate) -> Option<&CertificatePolicies> {
    match cert.extension(&ID_CE_CERTIFICATE_POLICIES) {
        Some(CertExtension::CertificatePolicies(cp)) => Some(cp),
        _ => None,
    }
}

fn policy_mappings(cert: &ParsedCertificate) -> Option<&PolicyMappings> {
    match cert.extension(&ID_CE_POLICY_MAPPINGS) {
        Some(CertExtension::PolicyMappings(pm)) => Some(pm),
        _ => None,
    }
}

fn policy_constraints(cert: &ParsedCertificate) -> Option<&PolicyConstraints> {
    match cert.extension(&ID_CE_POLICY_CONSTRAINTS) {
        Some(CertExtension::PolicyConstraints(pc)) => Some(pc),
        _ => None,
    }
}

fn inhibit_any_policy(cert: &ParsedCertificate) -> Option<&InhibitAnyPolicy> {
    match cert.extension(&ID_CE_INHIBIT_ANY_POLICY) {
        Some(CertExtension::InhibitAnyPolicy(iap)) => Some(iap),
        _ => None,
    }
}

fn extended_key_usage(cert: &ParsedCertificate) -> Option<&ExtendedKeyUsage> {
    match cert.extension(&ID_CE_EXT_KEY_USAGE) {
        Some(CertExtension::ExtendedKeyUsage(eku)) => Some(eku),
        _ => None,
    }
}

fn below_anchor(cp: &CertificationPath) -> Vec<&ParsedCertificate> {
    let mut v: Vec<&ParsedCertificate> = cp.intermediates.iter().collect();
    v.push(&cp.target);
    v
}

/// `check_names` performs name chaining per RFC 5280 6.1.3 (a)(4) and name
/// constraints processing per 6.1.3 (b)(c) and 6.1.4 (g) for each certificate
/// below the trust anchor.
pub fn check_names(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let v = below_anchor(cp);
    let mut state = NameConstraintsState::from_settings(
        cps.initial_permitted_subtrees.as_ref(),
        cps.initial_excluded_subtrees.as_ref(),
    )?;

    let mut working_issuer = &cp.trust_anchor.cert.tbs_certificate.subject;
    for (i, cert) in v.iter().enumerate() {
        let tbs = &cert.cert.tbs_certificate;
        if !crate::util::name_utils::compare_names(&tbs.issuer, working_issuer) {
            log_error_for_name(&tbs.subject, "name chaining failure");
            cpr.set_failing_certificate_index(i);
            return Err(status_err(PathValidationStatus::NameChainingFailure));
        }
        working_issuer = &tbs.subject;

        // self-issued certificates other than the final one are exempt from
        // name constraints per 6.1.3 (b)
        let exempt = is_self_issued(&cert.cert) && i + 1 != v.len();
        if !exempt {
            if let Err(e) = state.check_subject(&tbs.subject) {
                cpr.set_failing_certificate_index(i);
                return Err(e);
            }
            if let Some(san) = subject_alt_name(cert) {
                cpr.add_processed_extension(ID_CE_SUBJECT_ALT_NAME);
                if let Err(e) = state.check_san(san) {
                    cpr.set_failing_certificate_index(i);
                    return Err(e);
                }
            }
        }

        if let Some(nc) = name_constraints(cert) {
            cpr.add_processed_extension(ID_CE_NAME_CONSTRAINTS);
            if let Some(permitted) = &nc.permitted_subtrees {
                state.intersect_permitted(permitted);
            }
            if let Some(excluded) = &nc.excluded_subtrees {
                state.union_excluded(excluded);
            }
        }
    }
    Ok(())
}

/// `check_validity` confirms every certificate in the path was within its
/// validity window at the appropriate evaluation time. Under the default
/// model every certificate is checked at the time of interest; under the
/// chain model each CA certificate is checked at the generation time of the
/// certificate it issued.
pub fn check_validity(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let v = below_anchor(cp);
    let toi = cps.time_of_interest;
    match cps.validity_model {
        ValidityModel::PkixDefault => {
            if cps.enforce_trust_anchor_validity {
                valid_at_time(&cp.trust_anchor.cert.tbs_certificate, toi, false)?;
            }
            for (i, cert) in v.iter().enumerate() {
                if let Err(e) = valid_at_time(&cert.cert.tbs_certificate, toi, false) {
                    cpr.set_failing_certificate_index(i);
                    return Err(e);
                }
            }
        }
        ValidityModel::Chain => {
            if cps.enforce_trust_anchor_validity {
                let issuance = cert_generation_time(&v[0].cert.tbs_certificate)?;
                valid_at_time(&cp.trust_anchor.cert.tbs_certificate, issuance, false)?;
            }
            for (i, cert) in v.iter().enumerate() {
                let eval = if i + 1 == v.len() {
                    toi
                } else {
                    cert_generation_time(&v[i + 1].cert.tbs_certificate)?
                };
                if let Err(e) = valid_at_time(&cert.cert.tbs_certificate, eval, false) {
                    cpr.set_failing_certificate_index(i);
                    return Err(e);
                }
            }
        }
    }
    Ok(())
}

/// `verify_signatures` confirms the signature on each certificate below the
/// trust anchor using the working public key per RFC 5280 6.1.3 (a)(1).
/// Verification operates over the preserved to-be-signed bytes.
pub fn verify_signatures(
    pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let v = below_anchor(cp);
    let mut working_spki = &cp.trust_anchor.cert.tbs_certificate.subject_public_key_info;
    for (i, cert) in v.iter().enumerate() {
        let defer = RawSigned::from_der(&cert.encoded)?;
        if cert.cert.tbs_certificate.signature != defer.signature_algorithm {
            cpr.set_failing_certificate_index(i);
            return Err(status_err(PathValidationStatus::EncodingError));
        }
        let signature = defer
            .signature
            .as_bytes()
            .ok_or(status_err(PathValidationStatus::EncodingError))?;
        if pe
            .verify_signature_message(pe, &defer.tbs, signature, &defer.signature_algorithm, working_spki)
            .is_err()
        {
            log_error_for_name(
                &cert.cert.tbs_certificate.subject,
                "signature verification failure",
            );
            cpr.set_failing_certificate_index(i);
            return Err(status_err(
                PathValidationStatus::SignatureVerificationFailure,
            ));
        }
        working_spki = &cert.cert.tbs_certificate.subject_public_key_info;
    }
    Ok(())
}

/// `check_basic_constraints` confirms each intermediate CA certificate
/// asserts cA and that the path respects every pathLenConstraint and the
/// configured initial length limit per RFC 5280 6.1.4 (k)(l)(m).
pub fn check_basic_constraints(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let mut max_path_length = cps
        .initial_path_length_constraint
        .min(MAX_PATH_LENGTH_CONSTRAINT);

    for (i, cert) in cp.intermediates.iter().enumerate() {
        let bc = match basic_constraints(cert) {
            Some(bc) => bc,
            None => {
                cpr.set_failing_certificate_index(i);
                return Err(status_err(PathValidationStatus::MissingBasicConstraints));
            }
        };
        cpr.add_processed_extension(ID_CE_BASIC_CONSTRAINTS);
        if !bc.ca {
            cpr.set_failing_certificate_index(i);
            return Err(status_err(PathValidationStatus::InvalidBasicConstraints));
        }
        if !is_self_issued(&cert.cert) {
            if max_path_length == 0 {
                cpr.set_failing_certificate_index(i);
                return Err(status_err(PathValidationStatus::InvalidPathLength));
            }
            max_path_length -= 1;
        }
        if let Some(plc) = bc.path_len_constraint {
            if plc < max_path_length {
                max_path_length = plc;
            }
        }
    }
    Ok(())
}

/// `check_key_usage` confirms each intermediate CA certificate carrying a
/// keyUsage extension asserts keyCertSign per RFC 5280 6.1.4 (n).
pub fn check_key_usage(
    _pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    for (i, cert) in cp.intermediates.iter().enumerate() {
        if let Some(ku) = key_usage(cert) {
            cpr.add_processed_extension(ID_CE_KEY_USAGE);
            if !ku.0.contains(KeyUsages::KeyCertSign) {
                log_error_for_name(
                    &cert.cert.tbs_certificate.subject,
                    "keyCertSign not asserted by CA certificate",
                );
                cpr.set_failing_certificate_index(i);
                return Err(status_err(PathValidationStatus::InvalidKeyUsage));
            }
        }
    }
    Ok(())
}

/// `check_extended_key_usage` confirms the target certificate asserts every
/// configured extended key usage purpose, with anyExtendedKeyUsage accepted
/// as a stand-in. The check is disabled when no purposes are configured.
pub fn check_extended_key_usage(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    if cps.extended_key_usage.is_empty() {
        return Ok(());
    }
    let failing_index = cp.intermediates.len();
    let eku = match extended_key_usage(&cp.target) {
        Some(eku) => eku,
        None => {
            cpr.set_failing_certificate_index(failing_index);
            return Err(status_err(PathValidationStatus::InvalidKeyUsage));
        }
    };
    cpr.add_processed_extension(ID_CE_EXT_KEY_USAGE);
    for required in &cps.extended_key_usage {
        if !eku.0.contains(required) && !eku.0.contains(&ANY_EXTENDED_KEY_USAGE) {
            cpr.set_failing_certificate_index(failing_index);
            return Err(status_err(PathValidationStatus::InvalidKeyUsage));
        }
    }
    Ok(())
}

fn group_mappings(pm: &PolicyMappings) -> Result<GroupedMappings> {
    let mut mappings = GroupedMappings::new();
    for mapping in &pm.0 {
        // anyPolicy must not appear as issuer or subject domain policy
        if ANY_POLICY == mapping.issuer_domain_policy
            || ANY_POLICY == mapping.subject_domain_policy
        {
            return Err(status_err(PathValidationStatus::ProhibitedPolicyMapping));
        }
        mappings
            .entry(mapping.issuer_domain_policy)
            .or_default()
            .insert(mapping.subject_domain_policy);
    }
    Ok(mappings)
}

/// `check_certificate_policies` performs certificate policy processing per
/// RFC 5280 6.1.2 through 6.1.5, maintaining the valid-policy tree and the
/// explicit_policy, policy_mapping and inhibit_anyPolicy counters. The final
/// valid-policy tree, when non-null, is stored in the results object.
pub fn check_certificate_policies(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let v = below_anchor(cp);
    let n = v.len() as u32;

    let mut explicit_policy: u32 = if cps.initial_explicit_policy_indicator {
        0
    } else {
        n + 1
    };
    let mut policy_mapping: u32 = if cps.initial_policy_mapping_inhibit_indicator {
        0
    } else {
        n + 1
    };
    let mut inhibit_any: u32 = if cps.initial_inhibit_any_policy_indicator {
        0
    } else {
        n + 1
    };

    let mut tree: Option<PolicyTree> = Some(PolicyTree::new());

    // running intersection of the policies asserted along the path; empty
    // until the first certificatePolicies extension seeds it
    let mut acceptable = ObjectIdentifierSet::new();

    for (idx, cert) in v.iter().enumerate() {
        let i = idx + 1;
        let last = i == v.len();
        let self_issued = is_self_issued(&cert.cert);

        match certificate_policies(cert) {
            Some(policies) => {
                cpr.add_processed_extension(ID_CE_CERTIFICATE_POLICIES);
                let mut asserted = Vec::with_capacity(policies.0.len());
                for info in &policies.0 {
                    let qualifiers = match &info.policy_qualifiers {
                        Some(q) => Some(q.to_der()?),
                        None => None,
                    };
                    asserted.push((info.policy_identifier, qualifiers));
                }

                let pols: ObjectIdentifierSet =
                    asserted.iter().map(|(policy, _)| *policy).collect();
                if acceptable.is_empty() || acceptable.contains(&ANY_POLICY) {
                    acceptable = pols;
                } else {
                    acceptable.retain(|policy| pols.contains(policy));
                }

                let critical = cert
                    .cert
                    .tbs_certificate
                    .extensions
                    .as_deref()
                    .and_then(|exts| {
                        exts.iter()
                            .find(|e| e.extn_id == ID_CE_CERTIFICATE_POLICIES)
                    })
                    .map_or(false, |e| e.critical);
                let any_ok = inhibit_any > 0 || (!last && self_issued);
                let mut nulled = false;
                if let Some(t) = tree.as_mut() {
                    t.process_policies(i, &asserted, any_ok, critical);
                    nulled = !t.prune(i) || t.row_is_empty(i);
                }
                if nulled {
                    tree = None;
                }
            }
            // (e): no certificatePolicies extension nulls the tree
            None => tree = None,
        }

        // (f): either explicit_policy is positive or the tree is non-null
        if explicit_policy == 0 && tree.is_none() {
            log_error_for_name(
                &cert.cert.tbs_certificate.subject,
                "null valid-policy tree while explicit policy is required",
            );
            cpr.set_failing_certificate_index(idx);
            return Err(status_err(PathValidationStatus::NullPolicySet));
        }

        if !last {
            // 6.1.4 preparation for the next certificate
            if let Some(pm) = policy_mappings(cert) {
                cpr.add_processed_extension(ID_CE_POLICY_MAPPINGS);
                let mappings = match group_mappings(pm) {
                    Ok(m) => m,
                    Err(e) => {
                        cpr.set_failing_certificate_index(idx);
                        return Err(e);
                    }
                };
                let mut nulled = false;
                if let Some(t) = tree.as_mut() {
                    if policy_mapping > 0 {
                        t.apply_mappings(i, &mappings);
                    } else {
                        nulled = !t.delete_mapped_nodes(i, &mappings);
                    }
                }
                if nulled {
                    tree = None;
                }
            }

            if !self_issued {
                explicit_policy = explicit_policy.saturating_sub(1);
                policy_mapping = policy_mapping.saturating_sub(1);
                inhibit_any = inhibit_any.saturating_sub(1);
            }

            if let Some(pc) = policy_constraints(cert) {
                cpr.add_processed_extension(ID_CE_POLICY_CONSTRAINTS);
                if let Some(rep) = pc.require_explicit_policy {
                    explicit_policy = explicit_policy.min(rep);
                }
                if let Some(ipm) = pc.inhibit_policy_mapping {
                    policy_mapping = policy_mapping.min(ipm);
                }
            }
            if let Some(iap) = inhibit_any_policy(cert) {
                cpr.add_processed_extension(ID_CE_INHIBIT_ANY_POLICY);
                inhibit_any = inhibit_any.min(iap.0);
            }
        } else {
            // 6.1.5 wrap-up
            explicit_policy = explicit_policy.saturating_sub(1);
            if let Some(pc) = policy_constraints(cert) {
                cpr.add_processed_extension(ID_CE_POLICY_CONSTRAINTS);
                if let Some(rep) = pc.require_explicit_policy {
                    explicit_policy = explicit_policy.min(rep);
                }
            }

            if !cps.initial_policy_set_is_any() {
                let mut nulled = false;
                if let Some(t) = tree.as_mut() {
                    nulled = !t.intersect_with_user_set(i, &cps.initial_policy_set);
                }
                if nulled {
                    tree = None;
                }
            } else if cps.initial_explicit_policy_indicator
                && tree.is_some()
                && acceptable.is_empty()
            {
                // 6.1.5 (g)(ii): explicit policy required with an any-policy
                // user set, but no policy is asserted by every certificate
                log_error_for_name(
                    &cert.cert.tbs_certificate.subject,
                    "explicit policy required but no acceptable policy remains",
                );
                cpr.set_failing_certificate_index(idx);
                return Err(status_err(PathValidationStatus::NullPolicySet));
            }

            if explicit_policy == 0 && tree.is_none() {
                cpr.set_failing_certificate_index(idx);
                return Err(status_err(PathValidationStatus::NullPolicySet));
            }
        }
    }

    if let Some(t) = tree {
        cpr.set_final_valid_policy_tree(t.final_tree());
    }
    Ok(())
}

/// `check_critical_extensions` confirms every critical extension in the path
/// is one this implementation processes, per RFC 5280 6.1.3 (f) and 6.1.4 (o).
pub fn check_critical_extensions(
    _pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    for (i, cert) in below_anchor(cp).iter().enumerate() {
        if let Some(exts) = &cert.cert.tbs_certificate.extensions {
            for ext in exts {
                if EXTS_OF_INTEREST.contains(&&ext.extn_id) {
                    cpr.add_processed_extension(ext.extn_id);
                } else if ext.critical {
                    log_error_for_name(
                        &cert.cert.tbs_certificate.subject,
                        "unprocessed critical extension",
                    );
                    cpr.set_failing_certificate_index(i);
                    return Err(status_err(
                        PathValidationStatus::UnprocessedCriticalExtension,
                    ));
                }
            }
        }
    }
    Ok(())
}

/// `validate_path_rfc5280` validates a certification path per RFC 5280
/// section 6.1, recording the outcome in the results object. Revocation
/// status is checked when enabled in the settings and the `revocation`
/// feature is present.
pub fn validate_path_rfc5280(
    pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let result = validate_path_inner(pe, cps, cp, cpr);
    match &result {
        Ok(()) => cpr.set_validation_status(PathValidationStatus::Valid),
        Err(Error::PathValidation(status)) => cpr.set_validation_status(*status),
        Err(_) => cpr.set_validation_status(PathValidationStatus::EncodingError),
    }
    result
}

fn validate_path_inner(
    pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &mut CertificationPath,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    #[cfg(feature = "std")]
    if cps.time_of_interest.is_in_future() {
        return Err(status_err(PathValidationStatus::Misconfiguration));
    }

    check_names(pe, cps, cp, cpr)?;
    check_validity(pe, cps, cp, cpr)?;
    verify_signatures(pe, cps, cp, cpr)?;
    check_basic_constraints(pe, cps, cp, cpr)?;
    check_key_usage(pe, cps, cp, cpr)?;
    check_certificate_policies(pe, cps, cp, cpr)?;
    check_extended_key_usage(pe, cps, cp, cpr)?;
    check_critical_extensions(pe, cps, cp, cpr)?;

    #[cfg(feature = "revocation")]
    if cps.check_revocation_status {
        crate::revocation::check_revocation(pe, cps, cp, cpr)?;
    }

    Ok(())
}
