//! Validation configuration
//!
//! [`CertificationPathSettings`] is an immutable description of the inputs from
//! RFC 5280 section 6.1.1 plus engine toggles (validity model, revocation
//! processing). Mutable state accumulated while walking a path lives in
//! [`CertificationPathResults`](crate::CertificationPathResults) and in local
//! state threaded through the validation functions, never in the settings.

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;
use serde::{Deserialize, Serialize};

use crate::util::validation_time::ValidationTime;

/// Set of object identifiers, e.g., a certificate policy set
pub type ObjectIdentifierSet = BTreeSet<ObjectIdentifier>;

/// Upper bound enforced on certification path length irrespective of
/// pathLenConstraint values observed in the path
pub const MAX_PATH_LENGTH_CONSTRAINT: u8 = 15;

/// Validity models governing the evaluation date for each certificate in a path
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ValidityModel {
    /// Every certificate is evaluated at the single time of interest (the PKIX
    /// shell model)
    #[default]
    PkixDefault,
    /// Each CA certificate is evaluated at the time it issued the subordinate
    /// certificate, i.e., the subordinate's generation time; the target is
    /// evaluated at the time of interest
    Chain,
}

/// Initial permitted or excluded subtrees expressed in configuration-friendly
/// form: string values per name form plus address/mask byte strings for
/// iPAddress subtrees.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NameConstraintsSettings {
    /// directoryName subtrees as RFC 4514 strings
    pub directory_name: Option<Vec<String>>,
    /// rfc822Name subtrees
    pub rfc822_name: Option<Vec<String>>,
    /// dNSName subtrees
    pub dns_name: Option<Vec<String>>,
    /// uniformResourceIdentifier subtrees
    pub uniform_resource_identifier: Option<Vec<String>>,
    /// iPAddress subtrees as address octets followed by mask octets
    pub ip_address: Option<Vec<Vec<u8>>>,
}

impl NameConstraintsSettings {
    /// Returns true when no subtrees are present in any name form.
    pub fn is_empty(&self) -> bool {
        self.directory_name.is_none()
            && self.rfc822_name.is_none()
            && self.dns_name.is_none()
            && self.uniform_resource_identifier.is_none()
            && self.ip_address.is_none()
    }
}

mod oid_set_strings {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub(super) fn serialize<S>(set: &ObjectIdentifierSet, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(set.iter().map(|oid| oid.to_string()))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<ObjectIdentifierSet, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings: Vec<String> = Vec::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| ObjectIdentifier::new(s).map_err(D::Error::custom))
            .collect()
    }
}

/// Inputs governing a certification path validation operation
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CertificationPathSettings {
    /// initial-explicit-policy from RFC 5280 6.1.1: require the path to be
    /// valid for at least one policy from the initial policy set
    pub initial_explicit_policy_indicator: bool,
    /// initial-policy-mapping-inhibit from RFC 5280 6.1.1
    pub initial_policy_mapping_inhibit_indicator: bool,
    /// initial-any-policy-inhibit from RFC 5280 6.1.1
    pub initial_inhibit_any_policy_indicator: bool,
    /// user-initial-policy-set from RFC 5280 6.1.1; defaults to {anyPolicy}
    #[serde(with = "oid_set_strings")]
    pub initial_policy_set: ObjectIdentifierSet,
    /// Initial permitted subtrees applied before processing the path
    pub initial_permitted_subtrees: Option<NameConstraintsSettings>,
    /// Initial excluded subtrees applied before processing the path
    pub initial_excluded_subtrees: Option<NameConstraintsSettings>,
    /// Initial maximum path length, bounded by [`MAX_PATH_LENGTH_CONSTRAINT`]
    pub initial_path_length_constraint: u8,
    /// Time at which the path is evaluated
    pub time_of_interest: ValidationTime,
    /// Validity model governing per-certificate evaluation dates
    pub validity_model: ValidityModel,
    /// When true, the trust anchor certificate must itself be within its
    /// validity window at the time of interest
    pub enforce_trust_anchor_validity: bool,
    /// Extended key usages the target certificate must assert; empty disables
    /// the check
    #[serde(with = "oid_set_strings")]
    pub extended_key_usage: ObjectIdentifierSet,
    /// When true, revocation status must be determined for every certificate
    /// below the trust anchor
    pub check_revocation_status: bool,
    /// When true, delta CRLs are sought and applied during CRL processing
    pub use_deltas: bool,
}

impl Default for CertificationPathSettings {
    fn default() -> Self {
        let mut initial_policy_set = ObjectIdentifierSet::new();
        initial_policy_set.insert(ANY_POLICY);
        CertificationPathSettings {
            initial_explicit_policy_indicator: false,
            initial_policy_mapping_inhibit_indicator: false,
            initial_inhibit_any_policy_indicator: false,
            initial_policy_set,
            initial_permitted_subtrees: None,
            initial_excluded_subtrees: None,
            initial_path_length_constraint: MAX_PATH_LENGTH_CONSTRAINT,
            time_of_interest: ValidationTime::default(),
            validity_model: ValidityModel::default(),
            enforce_trust_anchor_validity: true,
            extended_key_usage: ObjectIdentifierSet::new(),
            check_revocation_status: true,
            use_deltas: true,
        }
    }
}

impl CertificationPathSettings {
    /// Returns true when the initial policy set is absent or is exactly
    /// {anyPolicy}, i.e., the caller accepts any policy.
    pub fn initial_policy_set_is_any(&self) -> bool {
        self.initial_policy_set.is_empty()
            || (self.initial_policy_set.len() == 1 && self.initial_policy_set.contains(&ANY_POLICY))
    }
}

/// `read_settings` loads a [`CertificationPathSettings`] from a JSON file.
#[cfg(feature = "std")]
pub fn read_settings(path: &str) -> crate::util::error::Result<CertificationPathSettings> {
    use crate::util::error::Error;
    let json = std::fs::read_to_string(path).map_err(|_| Error::NotFound)?;
    serde_json::from_str(&json).map_err(|_| Error::ParseError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let cps = CertificationPathSettings::default();
        assert!(!cps.initial_explicit_policy_indicator);
        assert!(!cps.initial_policy_mapping_inhibit_indicator);
        assert!(!cps.initial_inhibit_any_policy_indicator);
        assert!(cps.initial_policy_set_is_any());
        assert!(cps.initial_permitted_subtrees.is_none());
        assert!(cps.initial_excluded_subtrees.is_none());
        assert_eq!(MAX_PATH_LENGTH_CONSTRAINT, cps.initial_path_length_constraint);
        assert_eq!(ValidityModel::PkixDefault, cps.validity_model);
        assert!(cps.enforce_trust_anchor_validity);
        assert!(cps.extended_key_usage.is_empty());
        assert!(cps.check_revocation_status);
        assert!(cps.use_deltas);
    }

    #[test]
    fn settings_serde_round_trip() {
        let mut cps = CertificationPathSettings {
            initial_explicit_policy_indicator: true,
            time_of_interest: ValidationTime::from_unix_secs(1_600_000_000).unwrap(),
            validity_model: ValidityModel::Chain,
            ..Default::default()
        };
        cps.initial_policy_set.clear();
        cps.initial_policy_set
            .insert(ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.1"));
        cps.initial_permitted_subtrees = Some(NameConstraintsSettings {
            dns_name: Some(alloc::vec!["example.com".to_string()]),
            ..Default::default()
        });

        let json = serde_json::to_string(&cps).unwrap();
        let back: CertificationPathSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(cps, back);
        assert!(!back.initial_policy_set_is_any());
    }
}
