use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    cmp::Ordering,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    str::FromStr,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version is empty")]
    Empty,
    #[error("version has more than 3 components")]
    TooManyComponents,
    #[error("version component `{0}` isn't a number")]
    InvalidComponent(String),
}

/// Dotted engine version, like `1.0` or `2.1.3`.
///
/// Omitted components are treated as zero when comparing, so `1.0` and `1.0.0` are equal. The
/// original component count is kept for display purposes only.
///
/// ## Example
/// ```
/// use kscene::Version;
///
/// let required: Version = "1.0".parse().unwrap();
/// let engine: Version = "1.2.7".parse().unwrap();
/// assert!(engine.satisfies(&required));
/// assert_eq!(required.to_string(), "1.0");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    components: u8,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            components: 3,
        }
    }

    /// Checks whether something of this version can load content requiring `required`.
    pub fn satisfies(&self, required: &Version) -> bool {
        self >= required
    }

    fn key(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut values = [0u32; 3];
        let mut components = 0;
        for part in s.split('.') {
            if components == values.len() {
                return Err(VersionParseError::TooManyComponents);
            }
            // `u32::from_str` would also accept a leading `+`
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::InvalidComponent(part.to_string()));
            }
            values[components] = part
                .parse()
                .map_err(|_| VersionParseError::InvalidComponent(part.to_string()))?;
            components += 1;
        }

        Ok(Self {
            major: values[0],
            minor: values[1],
            patch: values[2],
            components: components as u8,
        })
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.components {
            1 => write!(f, "{}", self.major),
            2 => write!(f, "{}.{}", self.major, self.minor),
            _ => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted_versions() {
        let v: Version = "1.0".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 0, 0));
        assert_eq!(v, Version::new(1, 0, 0));
        assert_eq!("3".parse::<Version>().unwrap().to_string(), "3");
        assert_eq!("2.10.4".parse::<Version>().unwrap(), Version::new(2, 10, 4));
    }

    #[test]
    fn reject_malformed_versions() {
        assert_eq!("".parse::<Version>(), Err(VersionParseError::Empty));
        assert_eq!(
            "1.2.3.4".parse::<Version>(),
            Err(VersionParseError::TooManyComponents)
        );
        for bad in ["1.", ".1", "1..2", "v1.0", "1.0-beta", "+1", "1.-2"] {
            assert!(
                matches!(
                    bad.parse::<Version>(),
                    Err(VersionParseError::InvalidComponent(_))
                ),
                "`{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn ordering_ignores_component_count() {
        let a: Version = "1.2".parse().unwrap();
        let b: Version = "1.10".parse().unwrap();
        assert!(a < b);
        assert!(Version::new(1, 10, 0).satisfies(&b));
        assert!(!a.satisfies(&b));
    }
}
