//! Certificate-level helpers shared by validation and revocation processing

use alloc::format;

use der::asn1::{GeneralizedTime, ObjectIdentifier};
use der::Decode;
use log::error;
use x509_cert::name::Name;
use x509_cert::TbsCertificate;

use crate::util::error::{Error, PathValidationStatus, Result};
use crate::util::name_utils::name_to_string;
use crate::util::validation_time::ValidationTime;

/// Private extension conveying the date of certificate generation (ISIS-MTT).
/// When present it overrides the notBefore value under the chain validity model.
pub const DATE_OF_CERT_GEN: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.8.3.13");

/// `valid_at_time` confirms that a certificate was within its validity window
/// at the indicated time, returning [`PathValidationStatus::InvalidNotBeforeDate`]
/// or [`PathValidationStatus::InvalidNotAfterDate`] wrapped in an [`Error`] when
/// it was not. Checks are skipped when the time value is disabled.
pub fn valid_at_time(tbs: &TbsCertificate, toi: ValidationTime, stifle_log: bool) -> Result<()> {
    if toi.is_disabled() {
        return Ok(());
    }
    if toi < tbs.validity.not_before {
        if !stifle_log {
            log_error_for_name(
                &tbs.subject,
                format!("certificate is not valid until {}", tbs.validity.not_before).as_str(),
            );
        }
        return Err(Error::PathValidation(
            PathValidationStatus::InvalidNotBeforeDate,
        ));
    }
    if toi > tbs.validity.not_after {
        if !stifle_log {
            log_error_for_name(
                &tbs.subject,
                format!("certificate expired at {}", tbs.validity.not_after).as_str(),
            );
        }
        return Err(Error::PathValidation(
            PathValidationStatus::InvalidNotAfterDate,
        ));
    }
    Ok(())
}

/// `cert_generation_time` returns the time a certificate was generated for use
/// under the chain validity model: the dateOfCertGen private extension value
/// when present, else the notBefore value.
pub fn cert_generation_time(tbs: &TbsCertificate) -> Result<ValidationTime> {
    if let Some(exts) = &tbs.extensions {
        if let Some(ext) = exts.iter().find(|e| e.extn_id == DATE_OF_CERT_GEN) {
            let gt = GeneralizedTime::from_der(ext.extn_value.as_bytes())?;
            return ValidationTime::from_unix_secs(gt.to_unix_duration().as_secs())
                .map_err(Error::Asn1Error);
        }
    }
    ValidationTime::from_unix_secs(tbs.validity.not_before.to_unix_duration().as_secs())
        .map_err(Error::Asn1Error)
}

/// `log_error_for_name` emits an error-level log message naming the subject to
/// which the error applies.
pub fn log_error_for_name(name: &Name, msg: &str) {
    error!("{} for {}", msg, name_to_string(name));
}
