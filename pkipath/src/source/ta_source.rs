//! Manually populated in-memory trust anchor store
//!
//! ```no_run
//! use pkipath::{PkiEnvironment, TaSource};
//!
//! let mut pe = PkiEnvironment::default();
//!
//! let mut ta_source = TaSource::new();
//! // add trust anchors via add_encoded_trust_anchor then index them
//! ta_source.index_tas();
//!
//! pe.add_trust_anchor_source(Box::new(ta_source));
//! ```

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::{vec, vec::Vec};

use log::warn;
use sha2::{Digest, Sha256};

use const_oid::db::rfc5912::ID_CE_AUTHORITY_KEY_IDENTIFIER;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;

use crate::environment::pki_environment_traits::TrustAnchorSource;
use crate::util::error::{Error, Result};
use crate::util::name_utils::name_to_string;
use crate::validator::parsed_cert::{CertExtension, ParsedCertificate};

/// `key_id_or_spki_hash` returns the subjectKeyIdentifier value from a
/// certificate, falling back to the SHA-256 digest of the subjectPublicKey
/// when the extension is absent.
pub fn key_id_or_spki_hash(cert: &ParsedCertificate) -> Vec<u8> {
    if let Some(skid) = cert.subject_key_id() {
        return skid.to_vec();
    }
    let spk = cert
        .cert
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();
    Sha256::digest(spk).to_vec()
}

/// In-memory store of trust anchors with indices over key identifiers and
/// subject names. [`index_tas`](TaSource::index_tas) must be called after
/// population and before lookups.
#[derive(Default)]
pub struct TaSource {
    tas: Vec<ParsedCertificate>,
    skid_map: BTreeMap<Vec<u8>, usize>,
    name_map: BTreeMap<String, usize>,
}

impl TaSource {
    /// Instantiates an empty TaSource.
    pub fn new() -> TaSource {
        Default::default()
    }

    /// Adds a parsed trust anchor. Duplicates are ignored.
    pub fn add_trust_anchor(&mut self, ta: ParsedCertificate) {
        if !self.tas.contains(&ta) {
            self.tas.push(ta);
        }
    }

    /// Parses a binary DER-encoded certificate and adds it as a trust anchor.
    pub fn add_encoded_trust_anchor(&mut self, buf: &[u8]) -> Result<()> {
        self.add_trust_anchor(ParsedCertificate::try_from(buf)?);
        Ok(())
    }

    /// Builds the key identifier and name indices. Must be called after
    /// populating the store and before use.
    pub fn index_tas(&mut self) {
        self.skid_map.clear();
        self.name_map.clear();
        for (i, ta) in self.tas.iter().enumerate() {
            self.skid_map.insert(key_id_or_spki_hash(ta), i);
            self.name_map
                .insert(name_to_string(&ta.cert.tbs_certificate.subject), i);
        }
    }

    /// Returns the number of trust anchors in the store.
    pub fn len(&self) -> usize {
        self.tas.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tas.is_empty()
    }
}

impl TrustAnchorSource for TaSource {
    fn get_trust_anchors(&self) -> Result<Vec<&ParsedCertificate>> {
        Ok(self.tas.iter().collect())
    }

    fn get_trust_anchor_by_skid(&self, skid: &[u8]) -> Result<&ParsedCertificate> {
        match self.skid_map.get(skid) {
            Some(i) => Ok(&self.tas[*i]),
            None => Err(Error::NotFound),
        }
    }

    fn get_trust_anchor_by_name(&self, name: &Name) -> Result<&ParsedCertificate> {
        match self.name_map.get(&name_to_string(name)) {
            Some(i) => Ok(&self.tas[*i]),
            None => Err(Error::NotFound),
        }
    }

    fn get_trust_anchor_for_target(
        &self,
        target: &ParsedCertificate,
    ) -> Result<&ParsedCertificate> {
        let mut name_vec = vec![&target.cert.tbs_certificate.issuer];
        if let Some(CertExtension::AuthorityKeyIdentifier(akid)) =
            target.extension(&ID_CE_AUTHORITY_KEY_IDENTIFIER)
        {
            if let Some(kid) = &akid.key_identifier {
                match self.get_trust_anchor_by_skid(kid.as_bytes()) {
                    Ok(ta) => return Ok(ta),
                    Err(_) => {
                        warn!("Failed to find trust anchor by key identifier");
                    }
                }
            } else if let Some(names) = &akid.authority_cert_issuer {
                for n in names {
                    if let GeneralName::DirectoryName(dn) = n {
                        name_vec.push(dn);
                    }
                }
            }
        }
        for n in name_vec {
            if let Ok(ta) = self.get_trust_anchor_by_name(n) {
                return Ok(ta);
            }
        }
        Err(Error::NotFound)
    }

    fn is_trust_anchor(&self, cert: &ParsedCertificate) -> Result<()> {
        match self.skid_map.contains_key(&key_id_or_spki_hash(cert)) {
            true => Ok(()),
            false => Err(Error::NotFound),
        }
    }
}
