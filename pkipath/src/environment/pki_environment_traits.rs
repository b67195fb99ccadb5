//! Trait and function-pointer definitions used by [`PkiEnvironment`] to reach
//! validation, signature verification and storage implementations.

use alloc::vec::Vec;

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;

use crate::environment::pki_environment::PkiEnvironment;
use crate::util::error::Result;
use crate::validator::{
    CertificationPath, CertificationPathResults, CertificationPathSettings, ParsedCertificate,
};

/// `ValidatePath` is the signature for implementations that perform
/// certification path validation.
pub type ValidatePath = fn(
    &PkiEnvironment,
    &CertificationPathSettings,    // settings governing validation
    &mut CertificationPath,        // path to verify
    &mut CertificationPathResults, // accumulated results
) -> Result<()>;

/// `VerifySignatureMessage` is the signature for implementations that verify a
/// signature over a message.
pub type VerifySignatureMessage = fn(
    &PkiEnvironment,
    &[u8],                      // message to hash and verify
    &[u8],                      // signature
    &AlgorithmIdentifierOwned,  // signature algorithm
    &SubjectPublicKeyInfoOwned, // public key
) -> Result<()>;

/// The [`TrustAnchorSource`] trait provides access to trust anchors backed by
/// some means, i.e., hard-coded, file-based or a system store reached via FFI.
pub trait TrustAnchorSource {
    /// Returns references to the available trust anchors.
    fn get_trust_anchors(&self) -> Result<Vec<&ParsedCertificate>>;

    /// Returns the trust anchor with the given subject key identifier.
    fn get_trust_anchor_by_skid(&self, skid: &[u8]) -> Result<&ParsedCertificate>;

    /// Returns the trust anchor with the given subject name.
    fn get_trust_anchor_by_name(&self, name: &Name) -> Result<&ParsedCertificate>;

    /// Returns a trust anchor that may have issued the given certificate,
    /// keyed by authority key identifier when available and issuer name
    /// otherwise.
    fn get_trust_anchor_for_target(&self, target: &ParsedCertificate)
        -> Result<&ParsedCertificate>;

    /// Returns Ok when the given certificate is one of the trust anchors.
    fn is_trust_anchor(&self, cert: &ParsedCertificate) -> Result<()>;
}

/// The [`CertificateSource`] trait provides access to intermediate CA
/// certificates for use when assembling candidate paths.
pub trait CertificateSource {
    /// Returns references to the available certificates.
    fn get_certificates(&self) -> Result<Vec<&ParsedCertificate>>;

    /// Returns certificates with the given subject key identifier.
    fn get_certificates_for_skid(&self, skid: &[u8]) -> Result<Vec<&ParsedCertificate>>;

    /// Returns certificates with the given subject name.
    fn get_certificates_for_name(&self, name: &Name) -> Result<Vec<&ParsedCertificate>>;
}

/// The [`CrlSource`] trait defines the interface for storing and retrieving
/// CRLs in support of revocation status determination.
pub trait CrlSource {
    /// Retrieves CRLs that may cover the given certificate.
    fn get_crls(&self, cert: &ParsedCertificate) -> Result<Vec<Vec<u8>>>;

    /// Adds a CRL to the store.
    fn add_crl(&self, crl_buf: &[u8], crl: &CertificateList) -> Result<()>;
}
