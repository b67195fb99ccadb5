//! Evaluation date handling for certificate and CRL checks

use core::{cmp::Ordering, fmt, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Date and time at which a certification path (or CRL) is evaluated.
///
/// A value equal to the Unix epoch disables time checks, which is primarily
/// useful when replaying archived test artifacts.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct ValidationTime(pub der::DateTime);

impl fmt::Display for ValidationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ValidationTime {
    /// Returns a [`ValidationTime`] for which time checks are disabled
    pub fn disabled() -> Self {
        // zero duration cannot fall outside the range DateTime supports
        match der::DateTime::from_unix_duration(Duration::ZERO) {
            Ok(dt) => ValidationTime(dt),
            Err(_) => unreachable!(),
        }
    }

    /// Returns true when time checks are disabled for this value
    pub fn is_disabled(&self) -> bool {
        self.0.unix_duration() == Duration::ZERO
    }

    /// Creates a [`ValidationTime`] from seconds since the Unix epoch
    pub fn from_unix_secs(v: u64) -> der::Result<Self> {
        Ok(Self(der::DateTime::from_unix_duration(Duration::from_secs(
            v,
        ))?))
    }

    /// Returns seconds since the Unix epoch for this value
    pub fn as_unix_secs(&self) -> u64 {
        self.0.unix_duration().as_secs()
    }
}

#[cfg(feature = "std")]
impl ValidationTime {
    /// Creates a [`ValidationTime`] for the current system time
    pub fn now() -> Self {
        match der::DateTime::from_system_time(std::time::SystemTime::now()) {
            Ok(dt) => Self(dt),
            // system clock outside 1970..=9999 is not a recoverable condition
            Err(_) => Self::disabled(),
        }
    }

    /// Returns true when this value is later than the current system time
    pub fn is_in_future(&self) -> bool {
        !self.is_disabled() && *self > Self::now()
    }
}

#[cfg(feature = "std")]
impl Default for ValidationTime {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(not(feature = "std"))]
impl Default for ValidationTime {
    fn default() -> Self {
        Self::disabled()
    }
}

impl PartialEq<x509_cert::time::Time> for ValidationTime {
    fn eq(&self, other: &x509_cert::time::Time) -> bool {
        self.0.eq(&other.to_date_time())
    }
}

impl PartialOrd<x509_cert::time::Time> for ValidationTime {
    fn partial_cmp(&self, other: &x509_cert::time::Time) -> Option<Ordering> {
        self.0.partial_cmp(&other.to_date_time())
    }
}

impl PartialEq<ValidationTime> for x509_cert::time::Time {
    fn eq(&self, other: &ValidationTime) -> bool {
        self.to_date_time().eq(&other.0)
    }
}

impl PartialOrd<ValidationTime> for x509_cert::time::Time {
    fn partial_cmp(&self, other: &ValidationTime) -> Option<Ordering> {
        self.to_date_time().partial_cmp(&other.0)
    }
}

impl Serialize for ValidationTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.as_unix_secs())
    }
}

impl<'de> Deserialize<'de> for ValidationTime {
    fn deserialize<D>(deserializer: D) -> Result<ValidationTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        ValidationTime::from_unix_secs(secs)
            .map_err(|_| serde::de::Error::custom("evaluation time out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_cert::time::Time;

    #[test]
    fn disabled_time() {
        let t = ValidationTime::disabled();
        assert!(t.is_disabled());
        assert_eq!(0, t.as_unix_secs());
        assert!(!ValidationTime::from_unix_secs(1_600_000_000)
            .unwrap()
            .is_disabled());
    }

    #[test]
    fn compare_against_x509_time() {
        let toi = ValidationTime::from_unix_secs(1_600_000_000).unwrap();
        let before = Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_500_000_000)).unwrap(),
        );
        let after = Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_700_000_000)).unwrap(),
        );
        assert!(toi > before);
        assert!(toi < after);
        assert!(before < toi);
        assert!(after > toi);
    }

    #[test]
    fn serde_round_trip() {
        let toi = ValidationTime::from_unix_secs(1_600_000_000).unwrap();
        let json = serde_json::to_string(&toi).unwrap();
        assert_eq!("1600000000", json);
        let back: ValidationTime = serde_json::from_str(&json).unwrap();
        assert_eq!(toi, back);
    }
}
