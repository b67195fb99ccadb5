//! Certification path representation and the RFC 5280 section 6.1 validation
//! operations: name chaining, validity, basic constraints, key usage, name
//! constraints, certificate policy processing and critical extension accounting.

pub mod cert_path;
pub mod name_constraints_set;
pub mod parsed_cert;
pub mod path_results;
pub mod path_settings;
pub mod path_validator;
pub mod policy_tree;

pub use cert_path::*;
pub use name_constraints_set::*;
pub use parsed_cert::*;
pub use path_results::*;
pub use path_settings::*;
pub use path_validator::*;
pub use policy_tree::*;
