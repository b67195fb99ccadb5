//! PkiEnvironment aggregates function pointers and trait objects that supply
//! the functionality used while validating a certification path: signature
//! verification, path validation, and access to trust anchors, certificates
//! and CRLs.
//!
//! The aggregation allows implementations to vary. One deployment may verify
//! signatures in hardware while another uses the bundled software provider,
//! and trust anchors may come from a file, memory or a platform store.

use alloc::boxed::Box;
use alloc::{vec, vec::Vec};

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;

use crate::environment::pki_environment_traits::*;
use crate::util::crypto::verify_signature_message_rust_crypto;
use crate::util::error::{Error, Result};
use crate::validator::{
    CertificationPath, CertificationPathResults, CertificationPathSettings, ParsedCertificate,
};

#[cfg(feature = "std")]
type TaSourceObj = Box<dyn TrustAnchorSource + Send + Sync>;
#[cfg(not(feature = "std"))]
type TaSourceObj = Box<dyn TrustAnchorSource>;

#[cfg(feature = "std")]
type CertSourceObj = Box<dyn CertificateSource + Send + Sync>;
#[cfg(not(feature = "std"))]
type CertSourceObj = Box<dyn CertificateSource>;

#[cfg(feature = "std")]
type CrlSourceObj = Box<dyn CrlSource + Send + Sync>;
#[cfg(not(feature = "std"))]
type CrlSourceObj = Box<dyn CrlSource>;

/// [`PkiEnvironment`] provides a switchboard of callbacks so that support can
/// vary across platforms or be tailored for specific use cases.
#[derive(Default)]
pub struct PkiEnvironment {
    /// Functions that verify a signature over a message
    verify_signature_message_callbacks: Vec<VerifySignatureMessage>,

    /// Functions that validate a certification path
    validate_path_callbacks: Vec<ValidatePath>,

    /// Trait objects that provide access to trust anchors
    trust_anchor_sources: Vec<TaSourceObj>,

    /// Trait objects that provide access to certificates
    certificate_sources: Vec<CertSourceObj>,

    /// Trait objects that provide access to CRLs
    crl_sources: Vec<CrlSourceObj>,
}

impl PkiEnvironment {
    /// Returns a new [`PkiEnvironment`] with empty callback lists.
    pub fn new() -> PkiEnvironment {
        Default::default()
    }

    /// Clears every callback and source list.
    pub fn clear_all_callbacks(&mut self) {
        self.clear_verify_signature_message_callbacks();
        self.clear_validate_path_callbacks();
        self.clear_trust_anchor_sources();
        self.clear_certificate_sources();
        self.clear_crl_sources();
    }

    /// Adds a [`ValidatePath`] callback to the list used by validate_path.
    pub fn add_validate_path_callback(&mut self, c: ValidatePath) {
        self.validate_path_callbacks.push(c);
    }

    /// Clears the list of [`ValidatePath`] callbacks.
    pub fn clear_validate_path_callbacks(&mut self) {
        self.validate_path_callbacks.clear();
    }

    /// Iterates over validate path callbacks until one succeeds or all have
    /// been exhausted, returning the last error observed on failure.
    pub fn validate_path(
        &self,
        pe: &PkiEnvironment,
        cps: &CertificationPathSettings,
        cp: &mut CertificationPath,
        cpr: &mut CertificationPathResults,
    ) -> Result<()> {
        let mut err = None;
        for f in &self.validate_path_callbacks {
            match f(pe, cps, cp, cpr) {
                Ok(()) => return Ok(()),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// Adds a [`VerifySignatureMessage`] callback to the list used by
    /// verify_signature_message.
    pub fn add_verify_signature_message_callback(&mut self, c: VerifySignatureMessage) {
        self.verify_signature_message_callbacks.push(c);
    }

    /// Clears the list of [`VerifySignatureMessage`] callbacks.
    pub fn clear_verify_signature_message_callbacks(&mut self) {
        self.verify_signature_message_callbacks.clear();
    }

    /// Iterates over signature verification callbacks until one succeeds or
    /// all have been exhausted.
    pub fn verify_signature_message(
        &self,
        pe: &PkiEnvironment,
        message_to_verify: &[u8],
        signature: &[u8],
        signature_alg: &AlgorithmIdentifierOwned,
        spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()> {
        let mut err = None;
        for f in &self.verify_signature_message_callbacks {
            match f(pe, message_to_verify, signature, signature_alg, spki) {
                Ok(()) => return Ok(()),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// Adds a [`TrustAnchorSource`] object to the list used by trust anchor
    /// accessors.
    pub fn add_trust_anchor_source(&mut self, c: TaSourceObj) {
        self.trust_anchor_sources.push(c);
    }

    /// Clears the list of [`TrustAnchorSource`] objects.
    pub fn clear_trust_anchor_sources(&mut self) {
        self.trust_anchor_sources.clear();
    }

    /// Iterates over trust anchor sources until one returns the anchor with
    /// the given subject key identifier.
    pub fn get_trust_anchor_by_skid(&self, skid: &[u8]) -> Result<&ParsedCertificate> {
        for f in &self.trust_anchor_sources {
            if let Ok(r) = f.get_trust_anchor_by_skid(skid) {
                return Ok(r);
            }
        }
        Err(Error::NotFound)
    }

    /// Iterates over trust anchor sources until one returns the anchor with
    /// the given subject name.
    pub fn get_trust_anchor_by_name(&self, name: &Name) -> Result<&ParsedCertificate> {
        for f in &self.trust_anchor_sources {
            if let Ok(r) = f.get_trust_anchor_by_name(name) {
                return Ok(r);
            }
        }
        Err(Error::NotFound)
    }

    /// Iterates over trust anchor sources until one returns an anchor that may
    /// have issued the given certificate.
    pub fn get_trust_anchor_for_target(
        &self,
        target: &ParsedCertificate,
    ) -> Result<&ParsedCertificate> {
        for f in &self.trust_anchor_sources {
            if let Ok(r) = f.get_trust_anchor_for_target(target) {
                return Ok(r);
            }
        }
        Err(Error::NotFound)
    }

    /// Returns Ok when any trust anchor source recognizes the certificate as
    /// a trust anchor.
    pub fn is_trust_anchor(&self, cert: &ParsedCertificate) -> Result<()> {
        for f in &self.trust_anchor_sources {
            if f.is_trust_anchor(cert).is_ok() {
                return Ok(());
            }
        }
        Err(Error::NotFound)
    }

    /// Adds a [`CertificateSource`] object to the list.
    pub fn add_certificate_source(&mut self, c: CertSourceObj) {
        self.certificate_sources.push(c);
    }

    /// Clears the list of [`CertificateSource`] objects.
    pub fn clear_certificate_sources(&mut self) {
        self.certificate_sources.clear();
    }

    /// Returns certificates with the given subject name from all sources.
    pub fn get_certificates_for_name(&self, name: &Name) -> Result<Vec<&ParsedCertificate>> {
        let mut retval = vec![];
        for f in &self.certificate_sources {
            if let Ok(certs) = f.get_certificates_for_name(name) {
                retval.extend(certs);
            }
        }
        if retval.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(retval)
    }

    /// Returns certificates with the given subject key identifier from all
    /// sources.
    pub fn get_certificates_for_skid(&self, skid: &[u8]) -> Result<Vec<&ParsedCertificate>> {
        let mut retval = vec![];
        for f in &self.certificate_sources {
            if let Ok(certs) = f.get_certificates_for_skid(skid) {
                retval.extend(certs);
            }
        }
        if retval.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(retval)
    }

    /// Adds a [`CrlSource`] object to the list.
    pub fn add_crl_source(&mut self, c: CrlSourceObj) {
        self.crl_sources.push(c);
    }

    /// Clears the list of [`CrlSource`] objects.
    pub fn clear_crl_sources(&mut self) {
        self.crl_sources.clear();
    }

    /// Retrieves CRLs that may cover the given certificate from all sources.
    pub fn get_crls(&self, cert: &ParsedCertificate) -> Result<Vec<Vec<u8>>> {
        let mut retval = vec![];
        for f in &self.crl_sources {
            if let Ok(crls) = f.get_crls(cert) {
                retval.extend(crls);
            }
        }
        if retval.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(retval)
    }

    /// Adds a CRL to every store that accepts it.
    pub fn add_crl(&self, crl_buf: &[u8], crl: &CertificateList) -> Result<()> {
        let mut at_least_one_success = false;
        for f in &self.crl_sources {
            if f.add_crl(crl_buf, crl).is_ok() {
                at_least_one_success = true;
            }
        }
        if at_least_one_success {
            return Ok(());
        }
        Err(Error::StoreLookupFailed)
    }
}

/// `populate_5280_pki_environment` adds the default set of callbacks to a
/// [`PkiEnvironment`]:
/// - [`validate_path_rfc5280`](crate::validator::path_validator::validate_path_rfc5280)
/// - [`verify_signature_message_rust_crypto`]
pub fn populate_5280_pki_environment(pe: &mut PkiEnvironment) {
    pe.add_validate_path_callback(crate::validator::path_validator::validate_path_rfc5280);
    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
}
