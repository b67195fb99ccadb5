//! Wrappers around decoded certificates that cache extensions of interest

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use der::asn1::{BitString, ObjectIdentifier};
use der::{Decode, Encode};
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::pkix::crl::CrlDistributionPoints;
use x509_cert::ext::pkix::*;
use x509_cert::Certificate;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES,
    ID_CE_CRL_DISTRIBUTION_POINTS, ID_CE_EXT_KEY_USAGE, ID_CE_INHIBIT_ANY_POLICY, ID_CE_KEY_USAGE,
    ID_CE_NAME_CONSTRAINTS, ID_CE_POLICY_CONSTRAINTS, ID_CE_POLICY_MAPPINGS,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};

use crate::util::error::{Error, Result};

/// Extensions parsed when preparing a [`ParsedCertificate`]. These cover every
/// extension consulted during path validation and CRL processing; they are
/// decoded once and then available without re-parsing.
pub const EXTS_OF_INTEREST: &[&ObjectIdentifier] = &[
    &ID_CE_SUBJECT_KEY_IDENTIFIER,
    &ID_CE_AUTHORITY_KEY_IDENTIFIER,
    &ID_CE_BASIC_CONSTRAINTS,
    &ID_CE_NAME_CONSTRAINTS,
    &ID_CE_SUBJECT_ALT_NAME,
    &ID_CE_EXT_KEY_USAGE,
    &ID_CE_KEY_USAGE,
    &ID_CE_POLICY_CONSTRAINTS,
    &ID_CE_CERTIFICATE_POLICIES,
    &ID_CE_POLICY_MAPPINGS,
    &ID_CE_INHIBIT_ANY_POLICY,
    &ID_CE_CRL_DISTRIBUTION_POINTS,
];

/// Decoded extension values cached on a [`ParsedCertificate`]
#[derive(Clone, Eq, PartialEq)]
pub enum CertExtension {
    /// Decoded basicConstraints
    BasicConstraints(BasicConstraints),
    /// Decoded subjectKeyIdentifier
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    /// Decoded authorityKeyIdentifier
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    /// Decoded nameConstraints
    NameConstraints(NameConstraints),
    /// Decoded subjectAltName
    SubjectAltName(SubjectAltName),
    /// Decoded extKeyUsage
    ExtendedKeyUsage(ExtendedKeyUsage),
    /// Decoded keyUsage
    KeyUsage(KeyUsage),
    /// Decoded policyConstraints
    PolicyConstraints(PolicyConstraints),
    /// Decoded certificatePolicies
    CertificatePolicies(CertificatePolicies),
    /// Decoded policyMappings
    PolicyMappings(PolicyMappings),
    /// Decoded inhibitAnyPolicy
    InhibitAnyPolicy(InhibitAnyPolicy),
    /// Decoded cRLDistributionPoints
    CrlDistributionPoints(CrlDistributionPoints),
}

/// Map of extension OIDs to decoded extension values
pub type ParsedExtensions = BTreeMap<ObjectIdentifier, CertExtension>;

/// A binary DER-encoded certificate alongside its decoded form and the decoded
/// extensions listed in [`EXTS_OF_INTEREST`].
#[derive(Clone, Eq, PartialEq)]
pub struct ParsedCertificate {
    /// Binary DER-encoded certificate
    pub encoded: Vec<u8>,
    /// Decoded certificate
    pub cert: Certificate,
    exts: ParsedExtensions,
}

fn parse_extensions(cert: &Certificate) -> Result<ParsedExtensions> {
    let mut parsed = ParsedExtensions::new();
    let exts = match cert.tbs_certificate.extensions.as_ref() {
        Some(exts) => exts,
        None => return Ok(parsed),
    };
    for ext in exts {
        let v = ext.extn_value.as_bytes();
        let decoded = match ext.extn_id {
            ID_CE_BASIC_CONSTRAINTS => CertExtension::BasicConstraints(BasicConstraints::from_der(v)?),
            ID_CE_SUBJECT_KEY_IDENTIFIER => {
                CertExtension::SubjectKeyIdentifier(SubjectKeyIdentifier::from_der(v)?)
            }
            ID_CE_AUTHORITY_KEY_IDENTIFIER => {
                CertExtension::AuthorityKeyIdentifier(AuthorityKeyIdentifier::from_der(v)?)
            }
            ID_CE_NAME_CONSTRAINTS => CertExtension::NameConstraints(NameConstraints::from_der(v)?),
            ID_CE_SUBJECT_ALT_NAME => CertExtension::SubjectAltName(SubjectAltName::from_der(v)?),
            ID_CE_EXT_KEY_USAGE => CertExtension::ExtendedKeyUsage(ExtendedKeyUsage::from_der(v)?),
            ID_CE_KEY_USAGE => CertExtension::KeyUsage(KeyUsage::from_der(v)?),
            ID_CE_POLICY_CONSTRAINTS => {
                CertExtension::PolicyConstraints(PolicyConstraints::from_der(v)?)
            }
            ID_CE_CERTIFICATE_POLICIES => {
                CertExtension::CertificatePolicies(CertificatePolicies::from_der(v)?)
            }
            ID_CE_POLICY_MAPPINGS => CertExtension::PolicyMappings(PolicyMappings::from_der(v)?),
            ID_CE_INHIBIT_ANY_POLICY => {
                CertExtension::InhibitAnyPolicy(InhibitAnyPolicy::from_der(v)?)
            }
            ID_CE_CRL_DISTRIBUTION_POINTS => {
                CertExtension::CrlDistributionPoints(CrlDistributionPoints::from_der(v)?)
            }
            _ => continue,
        };
        parsed.insert(ext.extn_id, decoded);
    }
    Ok(parsed)
}

impl ParsedCertificate {
    /// Returns the cached decoded extension identified by `oid`, or None when
    /// the certificate does not carry it.
    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&CertExtension> {
        self.exts.get(oid)
    }

    /// Returns the subject public key identifier bytes when a
    /// subjectKeyIdentifier extension is present.
    pub fn subject_key_id(&self) -> Option<&[u8]> {
        match self.extension(&ID_CE_SUBJECT_KEY_IDENTIFIER) {
            Some(CertExtension::SubjectKeyIdentifier(skid)) => Some(skid.0.as_bytes()),
            _ => None,
        }
    }
}

impl TryFrom<&[u8]> for ParsedCertificate {
    type Error = Error;

    fn try_from(enc_cert: &[u8]) -> Result<Self> {
        let cert = Certificate::from_der(enc_cert)?;
        let exts = parse_extensions(&cert)?;
        Ok(ParsedCertificate {
            encoded: enc_cert.to_vec(),
            cert,
            exts,
        })
    }
}

impl TryFrom<Certificate> for ParsedCertificate {
    type Error = Error;

    fn try_from(cert: Certificate) -> Result<Self> {
        let encoded = cert.to_der()?;
        let exts = parse_extensions(&cert)?;
        Ok(ParsedCertificate {
            encoded,
            cert,
            exts,
        })
    }
}

/// [`RawSigned`] parses only the top-level SIGNED structure of a certificate or
/// CRL, preserving the raw TBS bytes.
///
/// Verifying over the preserved bytes avoids re-encoding the TBS content, which
/// matters for structures that were not strictly DER-encoded prior to signing.
pub struct RawSigned {
    /// Raw bytes of the to-be-signed field
    pub tbs: Vec<u8>,
    /// Signature algorithm
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// Signature value
    pub signature: BitString,
}

impl ::der::FixedTag for RawSigned {
    const TAG: ::der::Tag = ::der::Tag::Sequence;
}

impl<'a> ::der::DecodeValue<'a> for RawSigned {
    fn decode_value<R: ::der::Reader<'a>>(
        reader: &mut R,
        header: ::der::Header,
    ) -> ::der::Result<Self> {
        use ::der::Reader as _;
        reader.read_nested(header.length, |reader| {
            let tbs = reader.tlv_bytes()?;
            let signature_algorithm = reader.decode()?;
            let signature = reader.decode()?;
            Ok(Self {
                tbs: tbs.to_vec(),
                signature_algorithm,
                signature,
            })
        })
    }
}
