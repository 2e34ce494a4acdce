// ABOUTME: Version and version constraint values carried by package manager errors
// ABOUTME: Backed by semver, displayed exactly as written by the package author

use crate::name::PackageName;
use semver::VersionReq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing versions and constraints
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The text is not a version
    #[error("invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// The text is not a version constraint
    #[error("invalid version constraint '{input}': {reason}")]
    InvalidConstraint { input: String, reason: String },
}

/// An installed or available package/component version.
///
/// Short forms such as `1.5` are accepted and compare as `1.5.0`, but are
/// displayed the way they were written. Equality, ordering and hashing only
/// look at the numeric value.
#[derive(Debug, Clone)]
pub struct Version {
    inner: semver::Version,
    text: String,
}

impl Version {
    /// Parse a version, zero-filling missing minor/patch components
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let text = s.trim();
        let body = text.strip_prefix('v').unwrap_or(text);
        let split = body.find(|c: char| c == '-' || c == '+').unwrap_or(body.len());
        let (core, suffix) = body.split_at(split);

        let mut padded = core.to_string();
        for _ in core.split('.').count()..3 {
            padded.push_str(".0");
        }
        padded.push_str(suffix);

        let inner = semver::Version::parse(&padded).map_err(|e| VersionError::InvalidVersion {
            input: s.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            inner,
            text: text.to_string(),
        })
    }

    /// Create a version from its numeric components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            inner: semver::Version::new(major, minor, patch),
            text: format!("{major}.{minor}.{patch}"),
        }
    }

    /// The zero-filled semver value
    pub fn as_semver(&self) -> &semver::Version {
        &self.inner
    }

    /// The text as originally written
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
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
        self.inner.cmp(&other.inner)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A version requirement such as `>=2.0,<3.0`.
///
/// Comparators may be separated by commas or whitespace. A bare version
/// (`1.5`) is an exact requirement and `latest` matches every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    req: VersionReq,
    text: String,
}

impl Constraint {
    /// Parse a constraint expression
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let text = s.trim();
        if text.is_empty() {
            return Err(VersionError::InvalidConstraint {
                input: s.to_string(),
                reason: "empty constraint".to_string(),
            });
        }

        let req = VersionReq::parse(&normalize_comparators(text)).map_err(|e| {
            VersionError::InvalidConstraint {
                input: s.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            req,
            text: text.to_string(),
        })
    }

    /// Constraint matching every version
    pub fn any() -> Self {
        Self {
            req: VersionReq::STAR,
            text: "*".to_string(),
        }
    }

    /// Check whether a version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(&version.inner)
    }

    /// The underlying semver requirement
    pub fn as_version_req(&self) -> &VersionReq {
        &self.req
    }

    /// The text as originally written
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Insert the commas semver expects between whitespace-separated comparators
/// and turn bare versions into `=` comparators.
/// An operator standing alone (`>= 2.0`) stays attached to its version.
fn normalize_comparators(text: &str) -> String {
    if text == "latest" {
        return "*".to_string();
    }

    let mut out = String::with_capacity(text.len() + 4);
    let mut prev: Option<&str> = None;

    for token in text.split_whitespace() {
        if let Some(p) = prev {
            let prev_is_operator = p.chars().all(is_operator_char);
            if token.starts_with(is_operator_char) && !prev_is_operator && !p.ends_with(',') {
                out.push(',');
            }
            out.push(' ');
        }
        out.push_str(token);
        prev = Some(token);
    }

    out.split(',')
        .map(|comparator| {
            let comparator = comparator.trim();
            if comparator.starts_with(|c: char| c.is_ascii_digit()) {
                format!("={comparator}")
            } else {
                comparator.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '^' | '~')
}

impl FromStr for Constraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A constraint on a named package, such as `database>=2.0`.
///
/// The package is optional so a bare version constraint can stand in
/// wherever a package constraint is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConstraint {
    package: Option<PackageName>,
    constraint: Constraint,
}

impl PackageConstraint {
    /// Constrain `package` to versions matching `constraint`
    pub fn new(package: impl Into<PackageName>, constraint: Constraint) -> Self {
        Self {
            package: Some(package.into()),
            constraint,
        }
    }

    /// Parse `<package><constraint>`; a package name alone accepts any version
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let text = s.trim();
        let split = text
            .find(|c: char| is_operator_char(c) || c.is_whitespace() || c == '*')
            .unwrap_or(text.len());
        let (name, rest) = text.split_at(split);

        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Constraint::parse(text).map(Self::from);
        }

        let rest = rest.trim();
        let constraint = if rest.is_empty() {
            Constraint::any()
        } else {
            Constraint::parse(rest)?
        };
        Ok(Self::new(name, constraint))
    }

    /// Package the constraint applies to
    pub fn package(&self) -> Option<&PackageName> {
        self.package.as_ref()
    }

    /// Version part of the constraint
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Check whether a version of the package satisfies the constraint
    pub fn matches(&self, version: &Version) -> bool {
        self.constraint.matches(version)
    }
}

impl From<Constraint> for PackageConstraint {
    fn from(constraint: Constraint) -> Self {
        Self {
            package: None,
            constraint,
        }
    }
}

impl FromStr for PackageConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) if self.constraint.as_str() == "*" => write!(f, "{package}"),
            Some(package) => write!(f, "{package}{}", self.constraint),
            None => write!(f, "{}", self.constraint),
        }
    }
}

impl Serialize for PackageConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn c(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    #[test]
    fn test_short_version_displays_as_written() {
        let version = v("1.5");
        assert_eq!(version.to_string(), "1.5");
        assert_eq!(version.as_semver(), &semver::Version::new(1, 5, 0));
    }

    #[test]
    fn test_short_and_full_forms_compare_equal() {
        assert_eq!(v("1.5"), v("1.5.0"));
        assert_eq!(v("2"), Version::new(2, 0, 0));
        assert!(v("1.5") < v("1.10"));
        assert!(v("4.2") > v("4.1.9"));
    }

    #[test]
    fn test_prerelease_suffix_is_kept() {
        let version = v("1.0-rc1");
        assert_eq!(version.to_string(), "1.0-rc1");
        assert!(!version.as_semver().pre.is_empty());
        assert!(version < v("1.0"));
    }

    #[test]
    fn test_leading_v_is_accepted() {
        assert_eq!(v("v3.1"), Version::new(3, 1, 0));
    }

    #[test]
    fn test_invalid_version() {
        let err = Version::parse("latest").unwrap_err();
        assert!(matches!(err, VersionError::InvalidVersion { .. }));
        assert!(err.to_string().contains("'latest'"));

        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
    }

    #[test]
    fn test_constraint_matching() {
        let range = c(">=2.0,<3.0");
        assert!(range.matches(&v("2.0")));
        assert!(range.matches(&v("2.9.9")));
        assert!(!range.matches(&v("1.5")));
        assert!(!range.matches(&v("3.0")));
        assert_eq!(range.to_string(), ">=2.0,<3.0");
    }

    #[test]
    fn test_constraint_whitespace_separators() {
        let range = c(">=2.0 <3.0");
        assert!(range.matches(&v("2.5")));
        assert!(!range.matches(&v("3.1")));
        assert_eq!(range.to_string(), ">=2.0 <3.0");

        let spaced = c(">= 2.0");
        assert!(spaced.matches(&v("2.0")));
    }

    #[test]
    fn test_any_constraint() {
        let any = Constraint::any();
        assert!(any.matches(&v("0.0.1")));
        assert!(any.matches(&v("99")));
        assert_eq!(any.to_string(), "*");
    }

    #[test]
    fn test_invalid_constraint() {
        assert!(matches!(
            Constraint::parse("   "),
            Err(VersionError::InvalidConstraint { .. })
        ));
        assert!(Constraint::parse(">=banana").is_err());
    }

    #[test]
    fn test_serde_uses_written_text() {
        let version = v("1.5");
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"1.5\"");

        let constraint: Constraint = serde_json::from_str("\"<4.0\"").unwrap();
        assert_eq!(constraint.as_str(), "<4.0");
        assert!(serde_json::from_str::<Version>("\"nope\"").is_err());
    }

    #[test]
    fn test_bare_version_is_exact() {
        let exact = c("1.5");
        assert!(exact.matches(&v("1.5")));
        assert!(exact.matches(&v("1.5.0")));
        assert!(!exact.matches(&v("1.9")));
        assert!(!exact.matches(&v("2.0")));
        assert_eq!(exact.to_string(), "1.5");

        let pinned = c("1.5.2");
        assert!(pinned.matches(&v("1.5.2")));
        assert!(!pinned.matches(&v("1.5.3")));

        let bounded = c("1.0, <2.0");
        assert!(bounded.matches(&v("1.0.4")));
        assert!(!bounded.matches(&v("1.4")));
    }

    #[test]
    fn test_latest_matches_everything() {
        let latest = c("latest");
        assert!(latest.matches(&v("0.1")));
        assert!(latest.matches(&v("42.0.7")));
        assert_eq!(latest.to_string(), "latest");
    }

    #[test]
    fn test_package_constraint_parsing() {
        let dep = PackageConstraint::parse("database>=2.0").unwrap();
        assert_eq!(dep.package().unwrap(), "database");
        assert_eq!(dep.constraint().as_str(), ">=2.0");
        assert!(dep.matches(&v("2.1")));
        assert!(!dep.matches(&v("1.5")));
        assert_eq!(dep.to_string(), "database>=2.0");

        let spaced = PackageConstraint::parse("swss >=1.0 <2.0").unwrap();
        assert_eq!(spaced.package().unwrap(), "swss");
        assert!(spaced.matches(&v("1.2")));
        assert_eq!(spaced.to_string(), "swss>=1.0 <2.0");
    }

    #[test]
    fn test_package_constraint_without_version() {
        let any = PackageConstraint::parse("sonic-mgmt-framework").unwrap();
        assert_eq!(any.package().unwrap(), "sonic-mgmt-framework");
        assert!(any.matches(&v("0.0.1")));
        assert_eq!(any.to_string(), "sonic-mgmt-framework");
    }

    #[test]
    fn test_package_constraint_without_package() {
        let bare = PackageConstraint::parse(">=2.0").unwrap();
        assert!(bare.package().is_none());
        assert_eq!(bare.to_string(), ">=2.0");
        assert_eq!(PackageConstraint::from(c(">=2.0")), bare);

        assert!(PackageConstraint::parse("").is_err());
        assert!(PackageConstraint::parse("database>=banana").is_err());
    }

    #[test]
    fn test_package_constraint_serde() {
        let dep: PackageConstraint = serde_json::from_str("\"database>=2.0\"").unwrap();
        assert_eq!(serde_json::to_string(&dep).unwrap(), "\"database>=2.0\"");
    }
}
