//! Revocation status determination using CRLs, including partitioned CRLs,
//! delta CRLs and indirect CRLs.

pub mod check_revocation;
pub mod crl;

pub use check_revocation::*;
pub use crl::*;
