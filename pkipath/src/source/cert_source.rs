//! Manually populated in-memory store of intermediate CA certificates

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::environment::pki_environment_traits::CertificateSource;
use crate::source::ta_source::key_id_or_spki_hash;
use crate::util::error::{Error, Result};
use crate::util::name_utils::{compare_names, name_to_string};
use crate::validator::parsed_cert::ParsedCertificate;

/// Criteria for selecting certificates from a store. Fields left as None do
/// not constrain the selection.
#[derive(Clone, Default)]
pub struct CertificateSelector {
    /// Subject name the certificate must carry
    pub subject: Option<Name>,
    /// Issuer name the certificate must carry
    pub issuer: Option<Name>,
    /// Serial number the certificate must carry
    pub serial_number: Option<SerialNumber>,
    /// Subject key identifier the certificate must carry
    pub skid: Option<Vec<u8>>,
}

impl CertificateSelector {
    /// Returns true when the certificate satisfies every populated criterion.
    pub fn matches(&self, cert: &ParsedCertificate) -> bool {
        let tbs = &cert.cert.tbs_certificate;
        if let Some(subject) = &self.subject {
            if !compare_names(&tbs.subject, subject) {
                return false;
            }
        }
        if let Some(issuer) = &self.issuer {
            if !compare_names(&tbs.issuer, issuer) {
                return false;
            }
        }
        if let Some(serial) = &self.serial_number {
            if &tbs.serial_number != serial {
                return false;
            }
        }
        if let Some(skid) = &self.skid {
            if &key_id_or_spki_hash(cert) != skid {
                return false;
            }
        }
        true
    }
}

/// In-memory store of CA certificates with indices over subject names and key
/// identifiers. [`index_certs`](CertSource::index_certs) must be called after
/// population and before lookups.
#[derive(Default)]
pub struct CertSource {
    certs: Vec<ParsedCertificate>,
    skid_map: BTreeMap<Vec<u8>, Vec<usize>>,
    name_map: BTreeMap<String, Vec<usize>>,
}

impl CertSource {
    /// Instantiates an empty CertSource.
    pub fn new() -> CertSource {
        Default::default()
    }

    /// Adds a parsed certificate. Duplicates are ignored.
    pub fn add_certificate(&mut self, cert: ParsedCertificate) {
        if !self.certs.contains(&cert) {
            self.certs.push(cert);
        }
    }

    /// Parses a binary DER-encoded certificate and adds it.
    pub fn add_encoded_certificate(&mut self, buf: &[u8]) -> Result<()> {
        self.add_certificate(ParsedCertificate::try_from(buf)?);
        Ok(())
    }

    /// Builds the key identifier and name indices. Must be called after
    /// populating the store and before use.
    pub fn index_certs(&mut self) {
        self.skid_map.clear();
        self.name_map.clear();
        for (i, cert) in self.certs.iter().enumerate() {
            self.skid_map
                .entry(key_id_or_spki_hash(cert))
                .or_default()
                .push(i);
            self.name_map
                .entry(name_to_string(&cert.cert.tbs_certificate.subject))
                .or_default()
                .push(i);
        }
    }

    /// Returns certificates that satisfy the given selector.
    pub fn get_certificates_matching(
        &self,
        selector: &CertificateSelector,
    ) -> Result<Vec<&ParsedCertificate>> {
        let matches: Vec<&ParsedCertificate> =
            self.certs.iter().filter(|c| selector.matches(c)).collect();
        if matches.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(matches)
    }

    /// Returns the number of certificates in the store.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl CertificateSource for CertSource {
    fn get_certificates(&self) -> Result<Vec<&ParsedCertificate>> {
        Ok(self.certs.iter().collect())
    }

    fn get_certificates_for_skid(&self, skid: &[u8]) -> Result<Vec<&ParsedCertificate>> {
        match self.skid_map.get(skid) {
            Some(indices) => Ok(indices.iter().map(|i| &self.certs[*i]).collect()),
            None => Err(Error::NotFound),
        }
    }

    fn get_certificates_for_name(&self, name: &Name) -> Result<Vec<&ParsedCertificate>> {
        match self.name_map.get(&name_to_string(name)) {
            Some(indices) => Ok(indices.iter().map(|i| &self.certs[*i]).collect()),
            None => Err(Error::NotFound),
        }
    }
}
