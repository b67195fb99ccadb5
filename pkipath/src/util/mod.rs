//! Utility types shared across the crate: the error taxonomy, validation time
//! handling, name comparison and matching helpers, and the default crypto backend.

pub mod cert_utils;
pub mod crypto;
pub mod error;
pub mod name_utils;
pub mod validation_time;

pub use cert_utils::*;
pub use crypto::*;
pub use error::*;
pub use name_utils::*;
pub use validation_time::*;
