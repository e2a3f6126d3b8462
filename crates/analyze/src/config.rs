//! `.apiconfig` settings and analyzer preferences.
//!
//! The settings file is TOML:
//!
//! ```toml
//! major_version_increment = 1
//! minor_version_increment = 1
//! micro_version_increment = 1
//! major_version_error = "error"   # error | warning | ignore | filter
//! minor_version_error = "error"
//! micro_version_error = "error"
//! major_version_target = "major"  # optional
//! ```
//!
//! A file that is not valid TOML is an error. Individual keys with bad
//! values are logged and replaced by their defaults.

use apicompat_model::{Segment, Version};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;

/// What to do with a problem of a given kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    #[default]
    Error,
    Warning,
    /// Drop the problem.
    Ignore,
    /// Record the problem in the filter store instead of reporting it.
    Filter,
}

impl ErrorMode {
    fn parse(value: &str) -> Option<ErrorMode> {
        match value {
            "error" => Some(ErrorMode::Error),
            "warning" => Some(ErrorMode::Warning),
            "ignore" => Some(ErrorMode::Ignore),
            "filter" => Some(ErrorMode::Filter),
            _ => None,
        }
    }
}

/// How a version segment is expected to move when its rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionIncrementRule {
    pub target: Segment,
    pub amount: u32,
}

impl VersionIncrementRule {
    pub fn new(target: Segment, amount: u32) -> Self {
        VersionIncrementRule { target, amount }
    }

    /// The smallest version satisfying this rule starting from `reference`.
    pub fn apply(&self, reference: &Version) -> Version {
        reference.bump(self.target, self.amount)
    }
}

/// Per-component version policy read from `.apiconfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfigSettings {
    pub major: VersionIncrementRule,
    pub minor: VersionIncrementRule,
    pub micro: VersionIncrementRule,
    pub major_error: ErrorMode,
    pub minor_error: ErrorMode,
    pub micro_error: ErrorMode,
}

impl Default for ApiConfigSettings {
    fn default() -> Self {
        ApiConfigSettings {
            major: VersionIncrementRule::new(Segment::Major, 1),
            minor: VersionIncrementRule::new(Segment::Minor, 1),
            micro: VersionIncrementRule::new(Segment::Micro, 1),
            major_error: ErrorMode::Error,
            minor_error: ErrorMode::Error,
            micro_error: ErrorMode::Error,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    major_version_increment: Option<toml::Value>,
    minor_version_increment: Option<toml::Value>,
    micro_version_increment: Option<toml::Value>,
    major_version_target: Option<toml::Value>,
    minor_version_target: Option<toml::Value>,
    micro_version_target: Option<toml::Value>,
    major_version_error: Option<toml::Value>,
    minor_version_error: Option<toml::Value>,
    micro_version_error: Option<toml::Value>,
}

impl ApiConfigSettings {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = toml::from_str(input)?;
        let defaults = ApiConfigSettings::default();
        Ok(ApiConfigSettings {
            major: rule(
                "major",
                raw.major_version_target,
                raw.major_version_increment,
                defaults.major,
            ),
            minor: rule(
                "minor",
                raw.minor_version_target,
                raw.minor_version_increment,
                defaults.minor,
            ),
            micro: rule(
                "micro",
                raw.micro_version_target,
                raw.micro_version_increment,
                defaults.micro,
            ),
            major_error: mode("major_version_error", raw.major_version_error),
            minor_error: mode("minor_version_error", raw.minor_version_error),
            micro_error: mode("micro_version_error", raw.micro_version_error),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load `path` if it exists; any failure falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default API settings");
                Self::default()
            }
        }
    }
}

fn rule(
    segment: &str,
    target: Option<toml::Value>,
    amount: Option<toml::Value>,
    default: VersionIncrementRule,
) -> VersionIncrementRule {
    let target = match target {
        None => default.target,
        Some(toml::Value::String(s)) => match s.as_str() {
            "major" => Segment::Major,
            "minor" => Segment::Minor,
            "micro" => Segment::Micro,
            other => {
                warn!(segment, value = other, "unknown version target, using default");
                default.target
            }
        },
        Some(other) => {
            warn!(segment, value = %other, "version target must be a string, using default");
            default.target
        }
    };
    let amount = match amount {
        None => default.amount,
        Some(toml::Value::Integer(n)) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        Some(toml::Value::Integer(n)) => {
            warn!(segment, value = n, "version increment must be positive, using 1");
            1
        }
        Some(other) => {
            warn!(segment, value = %other, "version increment must be an integer, using default");
            default.amount
        }
    };
    VersionIncrementRule { target, amount }
}

fn mode(key: &str, value: Option<toml::Value>) -> ErrorMode {
    match value {
        None => ErrorMode::default(),
        Some(toml::Value::String(s)) => ErrorMode::parse(&s).unwrap_or_else(|| {
            warn!(key, value = %s, "unknown error mode, using error");
            ErrorMode::default()
        }),
        Some(other) => {
            warn!(key, value = %other, "error mode must be a string, using error");
            ErrorMode::default()
        }
    }
}

/// Preferences of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Report compatibility problems even when the major version was bumped.
    pub report_breakage_when_major_changed: bool,
    /// Report every problem regardless of version bumps.
    pub force_report: bool,
    pub check_since_tags: bool,
    /// Check extension and implementation of other components' types.
    pub check_usage: bool,
    pub compatibility: ErrorMode,
    pub usage: ErrorMode,
    pub missing_since_tag: ErrorMode,
    pub malformed_since_tag: ErrorMode,
    pub invalid_since_tag: ErrorMode,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        AnalyzerOptions {
            report_breakage_when_major_changed: false,
            force_report: false,
            check_since_tags: true,
            check_usage: true,
            compatibility: ErrorMode::Error,
            usage: ErrorMode::Error,
            missing_since_tag: ErrorMode::Error,
            malformed_since_tag: ErrorMode::Error,
            invalid_since_tag: ErrorMode::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(ApiConfigSettings::from_toml("").unwrap(), ApiConfigSettings::default());
    }

    #[test]
    fn reads_rules_and_modes() {
        let s = ApiConfigSettings::from_toml(
            r#"
            major_version_increment = 2
            minor_version_increment = 100
            micro_version_error = "ignore"
            minor_version_error = "warning"
            minor_version_target = "minor"
            "#,
        )
        .unwrap();
        assert_eq!(s.major.amount, 2);
        assert_eq!(s.minor.amount, 100);
        assert_eq!(s.micro_error, ErrorMode::Ignore);
        assert_eq!(s.minor_error, ErrorMode::Warning);
        assert_eq!(s.major_error, ErrorMode::Error);
        assert_eq!(s.minor.apply(&Version::new(1, 2, 3)).to_string(), "1.102.0");
    }

    #[test]
    fn bad_values_fall_back() {
        let s = ApiConfigSettings::from_toml(
            r#"
            major_version_increment = 0
            micro_version_increment = "lots"
            major_version_error = "explode"
            major_version_target = "nano"
            "#,
        )
        .unwrap();
        assert_eq!(s.major, VersionIncrementRule::new(Segment::Major, 1));
        assert_eq!(s.micro.amount, 1);
        assert_eq!(s.major_error, ErrorMode::Error);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            ApiConfigSettings::from_toml("major_version_increment = = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".apiconfig");
        assert_eq!(ApiConfigSettings::load_or_default(&path), ApiConfigSettings::default());
        std::fs::write(&path, "major_version_error = \"warning\"\n").unwrap();
        assert_eq!(
            ApiConfigSettings::load_or_default(&path).major_error,
            ErrorMode::Warning
        );
    }
}
