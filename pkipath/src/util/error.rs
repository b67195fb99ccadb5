//! Error types related to certification path processing

use x509_cert::ext::pkix::CrlReason;

/// Result type for the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Name forms subject to name constraints processing. Used to identify the
/// offending form when a constraint is violated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NameForm {
    /// directoryName form, i.e., a distinguished name
    DirectoryName,
    /// rfc822Name form, i.e., an email address
    Rfc822Name,
    /// dNSName form
    DnsName,
    /// uniformResourceIdentifier form
    UniformResourceIdentifier,
    /// iPAddress form
    IpAddress,
}

impl core::fmt::Display for NameForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NameForm::DirectoryName => write!(f, "directoryName"),
            NameForm::Rfc822Name => write!(f, "rfc822Name"),
            NameForm::DnsName => write!(f, "dNSName"),
            NameForm::UniformResourceIdentifier => write!(f, "uniformResourceIdentifier"),
            NameForm::IpAddress => write!(f, "iPAddress"),
        }
    }
}

/// Status values returned by certification path validation operations
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PathValidationStatus {
    /// Validation succeeded
    Valid,
    /// The issuer field of a certificate did not match the subject of the next
    /// certificate above it in the path
    NameChainingFailure,
    /// A signature could not be verified with the working public key
    SignatureVerificationFailure,
    /// A certificate was not yet valid at the evaluation time
    InvalidNotBeforeDate,
    /// A certificate was expired at the evaluation time
    InvalidNotAfterDate,
    /// An intermediate CA certificate lacked a basicConstraints extension
    MissingBasicConstraints,
    /// An intermediate CA certificate featured basicConstraints with cA set to false
    InvalidBasicConstraints,
    /// The path exceeded a pathLenConstraint or the configured initial length limit
    InvalidPathLength,
    /// A CA certificate or CRL signer lacked a required key usage bit
    InvalidKeyUsage,
    /// Certificate policy processing ended with a null valid-policy tree while
    /// explicit policy was required
    NullPolicySet,
    /// A policy mapping asserted anyPolicy as issuer or subject domain policy
    ProhibitedPolicyMapping,
    /// A subject name or alternative name violated the name constraints state
    NameConstraintsViolation(NameForm),
    /// A critical extension was not processed by any validation step
    UnprocessedCriticalExtension,
    /// No trust anchor was available for the path
    MissingTrustAnchor,
    /// A certificate in the path was revoked
    CertificateRevoked {
        /// Reason code from the CRL entry (or unspecified when absent)
        reason: CrlReason,
        /// Revocation date as seconds since the Unix epoch
        time: u64,
    },
    /// Revocation status could not be determined for a certificate in the path
    RevocationStatusNotDetermined,
    /// A field required by the profile was missing or malformed
    EncodingError,
    /// Validation inputs were inconsistent, e.g., an evaluation time in the future
    Misconfiguration,
}

/// Error values returned by operations throughout the crate
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Input was not recognized or no callback could service a request
    Unrecognized,
    /// Requested item was not found
    NotFound,
    /// Input could not be parsed, e.g., malformed settings JSON
    ParseError,
    /// A store lookup could not be performed
    StoreLookupFailed,
    /// Wraps a status from a certification path validation operation
    PathValidation(PathValidationStatus),
    /// Wraps an error from the `der` crate
    Asn1Error(der::Error),
    /// A CRL is not applicable to the certificate of interest
    CrlIncompatible,
    /// A CRL was outside its thisUpdate/nextUpdate window at the evaluation time
    CrlStale,
    /// A CRL featured an unsupported critical extension
    UnsupportedCrlExtension,
    /// A CRL entry featured an unsupported critical extension
    UnsupportedCrlEntryExtension,
    /// A distribution point name was expressed relative to the CRL issuer
    UnsupportedDistributionPointName,
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl core::fmt::Display for PathValidationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PathValidationStatus::Valid => write!(f, "Valid"),
            PathValidationStatus::NameChainingFailure => write!(f, "Name chaining failure"),
            PathValidationStatus::SignatureVerificationFailure => {
                write!(f, "Signature verification failure")
            }
            PathValidationStatus::InvalidNotBeforeDate => write!(f, "Invalid notBefore date"),
            PathValidationStatus::InvalidNotAfterDate => write!(f, "Invalid notAfter date"),
            PathValidationStatus::MissingBasicConstraints => write!(f, "Missing basic constraints"),
            PathValidationStatus::InvalidBasicConstraints => write!(f, "Invalid basic constraints"),
            PathValidationStatus::InvalidPathLength => write!(f, "Invalid path length"),
            PathValidationStatus::InvalidKeyUsage => write!(f, "Invalid key usage"),
            PathValidationStatus::NullPolicySet => write!(f, "Null policy set"),
            PathValidationStatus::ProhibitedPolicyMapping => {
                write!(f, "Prohibited policy mapping")
            }
            PathValidationStatus::NameConstraintsViolation(form) => {
                write!(f, "Name constraints violation ({})", form)
            }
            PathValidationStatus::UnprocessedCriticalExtension => {
                write!(f, "Unprocessed critical extension")
            }
            PathValidationStatus::MissingTrustAnchor => write!(f, "Missing trust anchor"),
            PathValidationStatus::CertificateRevoked { reason, .. } => {
                write!(f, "Certificate revoked (reason {:?})", reason)
            }
            PathValidationStatus::RevocationStatusNotDetermined => {
                write!(f, "Revocation status not determined")
            }
            PathValidationStatus::EncodingError => write!(f, "Encoding error"),
            PathValidationStatus::Misconfiguration => write!(f, "Misconfiguration"),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::NotFound => write!(f, "Not found"),
            Error::ParseError => write!(f, "Parse error"),
            Error::StoreLookupFailed => write!(f, "Store lookup failed"),
            Error::PathValidation(status) => write!(f, "Path validation: {}", status),
            Error::Asn1Error(e) => write!(f, "ASN.1: {}", e),
            Error::CrlIncompatible => write!(f, "CRL incompatible with certificate"),
            Error::CrlStale => write!(f, "CRL outside validity window"),
            Error::UnsupportedCrlExtension => write!(f, "Unsupported critical CRL extension"),
            Error::UnsupportedCrlEntryExtension => {
                write!(f, "Unsupported critical CRL entry extension")
            }
            Error::UnsupportedDistributionPointName => {
                write!(f, "Unsupported distribution point name form")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn error_display() {
        assert_eq!("Unrecognized", format!("{}", Error::Unrecognized));
        assert_eq!("Not found", format!("{}", Error::NotFound));
        assert_eq!("Store lookup failed", format!("{}", Error::StoreLookupFailed));
        assert_eq!(
            "CRL incompatible with certificate",
            format!("{}", Error::CrlIncompatible)
        );
        assert_eq!("CRL outside validity window", format!("{}", Error::CrlStale));
        assert_eq!(
            "Unsupported critical CRL extension",
            format!("{}", Error::UnsupportedCrlExtension)
        );
        assert_eq!(
            "Unsupported critical CRL entry extension",
            format!("{}", Error::UnsupportedCrlEntryExtension)
        );
        assert_eq!(
            "Unsupported distribution point name form",
            format!("{}", Error::UnsupportedDistributionPointName)
        );
        assert_eq!(
            "Path validation: Name chaining failure",
            format!(
                "{}",
                Error::PathValidation(PathValidationStatus::NameChainingFailure)
            )
        );
        assert_eq!(
            "Path validation: Name constraints violation (dNSName)",
            format!(
                "{}",
                Error::PathValidation(PathValidationStatus::NameConstraintsViolation(
                    NameForm::DnsName
                ))
            )
        );
    }

    #[test]
    fn status_display() {
        for (expected, status) in [
            ("Valid", PathValidationStatus::Valid),
            ("Name chaining failure", PathValidationStatus::NameChainingFailure),
            (
                "Signature verification failure",
                PathValidationStatus::SignatureVerificationFailure,
            ),
            ("Invalid notBefore date", PathValidationStatus::InvalidNotBeforeDate),
            ("Invalid notAfter date", PathValidationStatus::InvalidNotAfterDate),
            (
                "Missing basic constraints",
                PathValidationStatus::MissingBasicConstraints,
            ),
            (
                "Invalid basic constraints",
                PathValidationStatus::InvalidBasicConstraints,
            ),
            ("Invalid path length", PathValidationStatus::InvalidPathLength),
            ("Invalid key usage", PathValidationStatus::InvalidKeyUsage),
            ("Null policy set", PathValidationStatus::NullPolicySet),
            (
                "Prohibited policy mapping",
                PathValidationStatus::ProhibitedPolicyMapping,
            ),
            (
                "Unprocessed critical extension",
                PathValidationStatus::UnprocessedCriticalExtension,
            ),
            ("Missing trust anchor", PathValidationStatus::MissingTrustAnchor),
            (
                "Revocation status not determined",
                PathValidationStatus::RevocationStatusNotDetermined,
            ),
            ("Encoding error", PathValidationStatus::EncodingError),
            ("Misconfiguration", PathValidationStatus::Misconfiguration),
        ] {
            assert_eq!(expected, format!("{}", status));
        }
    }
}
