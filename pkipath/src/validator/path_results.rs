//! Outputs accumulated while validating a certification path

use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;

use crate::util::error::PathValidationStatus;
use crate::validator::path_settings::ObjectIdentifierSet;
use crate::validator::policy_tree::FinalValidPolicyTree;

/// Results from a certification path validation operation: the overall status,
/// the set of critical extensions that were processed, the final valid-policy
/// tree when policy processing produced one, and revocation artifacts.
///
/// The status starts out [`PathValidationStatus::Valid`] and retains the first
/// failure recorded, so partial results gathered after an initial failure do
/// not mask the original cause.
#[derive(Clone, Debug, Default)]
pub struct CertificationPathResults {
    status: Option<PathValidationStatus>,
    processed_extensions: ObjectIdentifierSet,
    final_valid_policy_tree: Option<FinalValidPolicyTree>,
    failing_certificate_index: Option<usize>,
    crls_used: Vec<Vec<u8>>,
}

impl CertificationPathResults {
    /// Instantiates an empty results object.
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a validation status. The first status recorded wins; subsequent
    /// calls are ignored.
    pub fn set_validation_status(&mut self, status: PathValidationStatus) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    /// Returns the recorded validation status.
    pub fn validation_status(&self) -> PathValidationStatus {
        self.status.unwrap_or(PathValidationStatus::Valid)
    }

    /// Returns true when a status has been recorded.
    pub fn validation_status_is_set(&self) -> bool {
        self.status.is_some()
    }

    /// Marks a critical extension as processed for the purposes of the
    /// RFC 5280 6.1.3 (f) unprocessed-critical-extension check.
    pub fn add_processed_extension(&mut self, oid: ObjectIdentifier) {
        self.processed_extensions.insert(oid);
    }

    /// Returns the set of extensions processed during validation.
    pub fn processed_extensions(&self) -> &ObjectIdentifierSet {
        &self.processed_extensions
    }

    /// Saves the valid-policy tree that remained after wrap-up processing.
    pub fn set_final_valid_policy_tree(&mut self, tree: FinalValidPolicyTree) {
        self.final_valid_policy_tree = Some(tree);
    }

    /// Returns the final valid-policy tree, when policy processing completed
    /// with a non-null tree.
    pub fn final_valid_policy_tree(&self) -> Option<&FinalValidPolicyTree> {
        self.final_valid_policy_tree.as_ref()
    }

    /// Records the index of the certificate at which validation failed, with
    /// zero denoting the certificate issued by the trust anchor.
    pub fn set_failing_certificate_index(&mut self, index: usize) {
        if self.failing_certificate_index.is_none() {
            self.failing_certificate_index = Some(index);
        }
    }

    /// Returns the index of the certificate at which validation failed.
    pub fn failing_certificate_index(&self) -> Option<usize> {
        self.failing_certificate_index
    }

    /// Records the encoded CRL consulted when determining revocation status.
    pub fn add_crl_used(&mut self, crl: Vec<u8>) {
        self.crls_used.push(crl);
    }

    /// Returns the encoded CRLs consulted during revocation processing.
    pub fn crls_used(&self) -> &[Vec<u8>] {
        &self.crls_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_status_wins() {
        let mut cpr = CertificationPathResults::new();
        assert_eq!(PathValidationStatus::Valid, cpr.validation_status());
        assert!(!cpr.validation_status_is_set());

        cpr.set_validation_status(PathValidationStatus::NameChainingFailure);
        cpr.set_validation_status(PathValidationStatus::InvalidPathLength);
        assert_eq!(
            PathValidationStatus::NameChainingFailure,
            cpr.validation_status()
        );

        cpr.set_failing_certificate_index(1);
        cpr.set_failing_certificate_index(2);
        assert_eq!(Some(1), cpr.failing_certificate_index());
    }

    #[test]
    fn processed_extensions_accumulate() {
        use const_oid::db::rfc5912::{ID_CE_BASIC_CONSTRAINTS, ID_CE_KEY_USAGE};
        let mut cpr = CertificationPathResults::new();
        cpr.add_processed_extension(ID_CE_BASIC_CONSTRAINTS);
        cpr.add_processed_extension(ID_CE_KEY_USAGE);
        cpr.add_processed_extension(ID_CE_BASIC_CONSTRAINTS);
        assert_eq!(2, cpr.processed_extensions().len());
    }
}
