//! Callback and trait-object plumbing that lets signature verification, path
//! validation and storage back ends vary per platform or deployment.

pub mod pki_environment;
pub mod pki_environment_traits;

pub use pki_environment::*;
pub use pki_environment_traits::*;
