//! Certification path structure

use alloc::vec;
use alloc::vec::Vec;

use crate::validator::parsed_cert::ParsedCertificate;

/// A sequence of certificates subject to validation: a trust anchor, zero or
/// more intermediate CA certificates ordered from the certificate issued by the
/// trust anchor down to the issuer of the target, and the target certificate.
///
/// `crls` optionally carries one stapled CRL per certificate (intermediates
/// followed by target), for callers that obtained revocation data out of band.
#[readonly::make]
pub struct CertificationPath {
    /// Trust anchor certificate for the path
    pub trust_anchor: ParsedCertificate,
    /// Intermediate CA certificates, top-down
    pub intermediates: Vec<ParsedCertificate>,
    /// Certificate that is the subject of validation
    pub target: ParsedCertificate,
    /// Optional stapled CRLs, one slot per certificate below the anchor
    pub crls: Vec<Option<Vec<u8>>>,
}

impl CertificationPath {
    /// Instantiates a path from a trust anchor, intermediates and target.
    pub fn new(
        trust_anchor: ParsedCertificate,
        intermediates: Vec<ParsedCertificate>,
        target: ParsedCertificate,
    ) -> Self {
        let count = intermediates.len() + 1;
        CertificationPath {
            trust_anchor,
            intermediates,
            target,
            crls: vec![None; count],
        }
    }

    /// Returns true when at least one stapled CRL is present.
    pub fn stapled_rev_info_available(&self) -> bool {
        self.crls.iter().any(|c| c.is_some())
    }

    /// Supplies a stapled CRL for the certificate at `pos` (intermediates
    /// followed by target).
    pub fn staple_crl(&mut self, pos: usize, crl: Vec<u8>) {
        if pos < self.crls.len() {
            self.crls[pos] = Some(crl);
        }
    }
}
