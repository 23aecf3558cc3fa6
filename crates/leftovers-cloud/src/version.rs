//! Management plane API version

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CloudError;

/// API version reported by the management plane (e.g. "37.1")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether this version is at least `other`
    pub fn at_least(&self, other: ApiVersion) -> bool {
        *self >= other
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CloudError::InvalidVersion(s.to_string());

        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        // "38" is accepted as "38.0"
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = CloudError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("37.1".parse::<ApiVersion>().unwrap(), ApiVersion::new(37, 1));
        assert_eq!("38".parse::<ApiVersion>().unwrap(), ApiVersion::new(38, 0));
        assert!("37.x".parse::<ApiVersion>().is_err());
        assert!("37.1.2".parse::<ApiVersion>().is_err());
        assert!("".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let min = ApiVersion::new(37, 1);
        assert!(ApiVersion::new(37, 1).at_least(min));
        assert!(ApiVersion::new(37, 2).at_least(min));
        assert!(ApiVersion::new(38, 0).at_least(min));
        assert!(!ApiVersion::new(37, 0).at_least(min));
        assert!(!ApiVersion::new(36, 9).at_least(min));
    }
}
