//! In-memory stores for trust anchors, CA certificates and CRLs that plug into
//! a [`PkiEnvironment`](crate::environment::pki_environment::PkiEnvironment).

pub mod cert_source;
pub mod crl_source;
pub mod ta_source;

pub use cert_source::*;
pub use crl_source::*;
pub use ta_source::*;
