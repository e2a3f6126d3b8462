//! Bundle versions (`major.minor.micro[.qualifier]`) and interval ranges.
//!
//! The qualifier is preserved for display but ignored by every comparison,
//! so `1.2.0.v2024` and `1.2.0` are equal versions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// One of the three numeric version segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Major,
    Minor,
    Micro,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Major => write!(f, "major"),
            Segment::Minor => write!(f, "minor"),
            Segment::Micro => write!(f, "micro"),
        }
    }
}

/// A component version as read from a `Bundle-Version` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub qualifier: Option<String>,
}

impl Version {
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Version {
            major,
            minor,
            micro,
            qualifier: None,
        }
    }

    pub fn segment(&self, segment: Segment) -> u32 {
        match segment {
            Segment::Major => self.major,
            Segment::Minor => self.minor,
            Segment::Micro => self.micro,
        }
    }

    /// Increment `segment` by `amount`, resetting the less significant
    /// segments and dropping the qualifier.
    pub fn bump(&self, segment: Segment, amount: u32) -> Version {
        match segment {
            Segment::Major => Version::new(self.major.saturating_add(amount), 0, 0),
            Segment::Minor => Version::new(self.major, self.minor.saturating_add(amount), 0),
            Segment::Micro => Version::new(
                self.major,
                self.minor,
                self.micro.saturating_add(amount),
            ),
        }
    }

    /// The `major.minor` form used by since tags.
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.micro)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::new(0, 0, 0)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(q) = &self.qualifier {
            write!(f, ".{}", q)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ModelError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty version"));
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numeric = |name: &str| -> Result<u32, ModelError> {
            match parts.next() {
                None => Ok(0),
                Some(p) => p
                    .parse::<u32>()
                    .map_err(|_| invalid(&format!("{} segment '{}' is not a number", name, p))),
            }
        };
        let major = numeric("major")?;
        let minor = numeric("minor")?;
        let micro = numeric("micro")?;
        let qualifier = match parts.next() {
            None => None,
            Some("") => return Err(invalid("empty qualifier")),
            Some(q) => Some(q.to_string()),
        };

        Ok(Version {
            major,
            minor,
            micro,
            qualifier,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

/// A version interval in manifest notation, e.g. `[1.0.0,2.0.0)`.
///
/// A bare version `1.0.0` means "1.0.0 or later".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    pub min: Version,
    pub min_inclusive: bool,
    pub max: Option<Version>,
    pub max_inclusive: bool,
}

impl VersionRange {
    /// The open-ended range `[min, ∞)`.
    pub fn at_least(min: Version) -> Self {
        VersionRange {
            min,
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    pub fn includes(&self, version: &Version) -> bool {
        let above_min = match version.cmp(&self.min) {
            Ordering::Greater => true,
            Ordering::Equal => self.min_inclusive,
            Ordering::Less => false,
        };
        let below_max = match &self.max {
            None => true,
            Some(max) => match version.cmp(max) {
                Ordering::Less => true,
                Ordering::Equal => self.max_inclusive,
                Ordering::Greater => false,
            },
        };
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.max {
            None if self.min_inclusive => write!(f, "{}", self.min),
            None => write!(f, "({},)", self.min),
            Some(max) => write!(
                f,
                "{}{},{}{}",
                if self.min_inclusive { '[' } else { '(' },
                self.min,
                max,
                if self.max_inclusive { ']' } else { ')' }
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = ModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ModelError::InvalidRange {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let min_inclusive = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => {
                let min = trimmed
                    .parse::<Version>()
                    .map_err(|e| invalid(e.to_string()))?;
                return Ok(VersionRange::at_least(min));
            }
        };
        let max_inclusive = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid("missing closing ']' or ')'".to_string())),
        };

        let inner = &trimmed[1..trimmed.len() - 1];
        let (low, high) = inner
            .split_once(',')
            .ok_or_else(|| invalid("expected two comma separated bounds".to_string()))?;
        let min = low.parse::<Version>().map_err(|e| invalid(e.to_string()))?;
        let max = if high.trim().is_empty() {
            None
        } else {
            Some(high.parse::<Version>().map_err(|e| invalid(e.to_string()))?)
        };

        if let Some(max) = &max {
            if max < &min {
                return Err(invalid(format!("upper bound {} is below {}", max, min)));
            }
        }

        Ok(VersionRange {
            min,
            min_inclusive,
            max,
            max_inclusive,
        })
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> Self {
        r.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_version_with_qualifier() {
        let v: Version = "3.4.1.v20080101".parse().unwrap();
        assert_eq!((v.major, v.minor, v.micro), (3, 4, 1));
        assert_eq!(v.qualifier.as_deref(), Some("v20080101"));
        assert_eq!(v.to_string(), "3.4.1.v20080101");
    }

    #[test]
    fn missing_segments_default_to_zero() {
        let v: Version = "2".parse().unwrap();
        assert_eq!(v, Version::new(2, 0, 0));
        let v: Version = "2.1".parse().unwrap();
        assert_eq!(v, Version::new(2, 1, 0));
    }

    #[test]
    fn qualifier_is_ignored_for_comparison() {
        let a: Version = "1.2.0.alpha".parse().unwrap();
        let b: Version = "1.2.0.beta".parse().unwrap();
        assert_eq!(a, b);
        assert!(Version::new(1, 2, 1) > a);
    }

    #[test]
    fn rejects_non_numeric_segments() {
        assert!("1.x.0".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
        assert!("1.0.0.".parse::<Version>().is_err());
    }

    #[test]
    fn bump_resets_lower_segments() {
        let v: Version = "1.4.7.qualifier".parse().unwrap();
        assert_eq!(v.bump(Segment::Major, 1).to_string(), "2.0.0");
        assert_eq!(v.bump(Segment::Minor, 2).to_string(), "1.6.0");
        assert_eq!(v.bump(Segment::Micro, 100).to_string(), "1.4.107");
    }

    #[test]
    fn interval_range_bounds() {
        let r: VersionRange = "[1.0.0,2.0.0)".parse().unwrap();
        assert!(r.includes(&Version::new(1, 0, 0)));
        assert!(r.includes(&Version::new(1, 9, 9)));
        assert!(!r.includes(&Version::new(2, 0, 0)));

        let r: VersionRange = "(1.0.0,2.0.0]".parse().unwrap();
        assert!(!r.includes(&Version::new(1, 0, 0)));
        assert!(r.includes(&Version::new(2, 0, 0)));
    }

    #[test]
    fn bare_version_range_is_open_ended() {
        let r: VersionRange = "1.5".parse().unwrap();
        assert!(r.includes(&Version::new(7, 0, 0)));
        assert!(!r.includes(&Version::new(1, 4, 0)));
        assert_eq!(r.to_string(), "1.5.0");
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert!("[1.0.0,2.0.0".parse::<VersionRange>().is_err());
        assert!("[1.0.0]".parse::<VersionRange>().is_err());
        assert!("[2.0.0,1.0.0)".parse::<VersionRange>().is_err());
    }

    #[test]
    fn range_round_trips_through_serde() {
        let r: VersionRange = serde_json::from_str("\"[3.0.0,4.0.0)\"").unwrap();
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"[3.0.0,4.0.0)\"");
    }
}
