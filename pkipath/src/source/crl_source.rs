//! In-memory CRL store keyed by issuer name
//!
//! CRLs are stored under their issuer name and retrieved using the issuer
//! name of the certificate being checked. Indirect CRLs whose issuer differs
//! from the certificate issuer are supplied by stapling them to the path
//! instead.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use core::cell::RefCell;
#[cfg(feature = "std")]
use std::sync::Mutex;

use x509_cert::crl::CertificateList;

use crate::environment::pki_environment_traits::CrlSource;
use crate::util::error::{Error, Result};
use crate::util::name_utils::name_to_string;
use crate::validator::parsed_cert::ParsedCertificate;

type IssuerMap = BTreeMap<String, Vec<Vec<u8>>>;

/// In-memory CRL store that supports saving CRLs obtained out of band for use
/// during revocation status determination.
#[derive(Default)]
pub struct CrlSourceMap {
    #[cfg(feature = "std")]
    crls: Mutex<IssuerMap>,

    #[cfg(not(feature = "std"))]
    crls: RefCell<IssuerMap>,
}

impl CrlSourceMap {
    /// Instantiates an empty CrlSourceMap.
    pub fn new() -> CrlSourceMap {
        Default::default()
    }
}

impl CrlSource for CrlSourceMap {
    fn get_crls(&self, cert: &ParsedCertificate) -> Result<Vec<Vec<u8>>> {
        #[cfg(feature = "std")]
        let crls = match self.crls.lock() {
            Ok(g) => g,
            Err(_) => return Err(Error::StoreLookupFailed),
        };
        #[cfg(not(feature = "std"))]
        let crls = self.crls.borrow();

        let key = name_to_string(&cert.cert.tbs_certificate.issuer);
        match crls.get(&key) {
            Some(bufs) => Ok(bufs.clone()),
            None => Err(Error::NotFound),
        }
    }

    fn add_crl(&self, crl_buf: &[u8], crl: &CertificateList) -> Result<()> {
        #[cfg(feature = "std")]
        let mut crls = match self.crls.lock() {
            Ok(g) => g,
            Err(_) => return Err(Error::StoreLookupFailed),
        };
        #[cfg(not(feature = "std"))]
        let mut crls = self.crls.borrow_mut();

        let key = name_to_string(&crl.tbs_cert_list.issuer);
        let entry = crls.entry(key).or_default();
        let buf = crl_buf.to_vec();
        if !entry.contains(&buf) {
            entry.push(buf);
        }
        Ok(())
    }
}
