use crate::error::{MonorepoHelperError, Result};
use std::fmt;

/// A single pre-release identifier ("alpha1", "rc", "1")
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::AlphaNumeric(s) => write!(f, "{}", s),
        }
    }
}

/// Semantic version representation
///
/// Only constructible through [SemanticVersion::parse]; increment operations
/// return new values and never mutate in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<Identifier>,
}

impl SemanticVersion {
    /// Parse a version from a tag string
    ///
    /// Accepts `MAJOR.MINOR.PATCH` with an optional `-PRERELEASE` suffix. A
    /// leading non-numeric prefix (e.g. "v1.2.3") is tolerated before the
    /// numeric core. Anything else is a version error, which callers treat
    /// as "skip this candidate", not as fatal.
    pub fn parse(tag: &str) -> Result<Self> {
        // Tolerate prefixes like 'v' or 'release-' before the numeric core.
        let core = tag.trim_start_matches(|c: char| !c.is_ascii_digit());
        if core.is_empty() {
            return Err(MonorepoHelperError::version(format!(
                "'{}' has no numeric version core",
                tag
            )));
        }

        let (numbers, prerelease) = match core.split_once('-') {
            Some((numbers, prerelease)) => (numbers, Some(prerelease)),
            None => (core, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() != 3 {
            return Err(MonorepoHelperError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                tag
            )));
        }

        let major = parts[0].parse::<u64>().map_err(|_| {
            MonorepoHelperError::version(format!("Invalid major version: {}", parts[0]))
        })?;
        let minor = parts[1].parse::<u64>().map_err(|_| {
            MonorepoHelperError::version(format!("Invalid minor version: {}", parts[1]))
        })?;
        let patch = parts[2].parse::<u64>().map_err(|_| {
            MonorepoHelperError::version(format!("Invalid patch version: {}", parts[2]))
        })?;

        let prerelease = match prerelease {
            Some(suffix) => parse_identifiers(tag, suffix)?,
            None => Vec::new(),
        };

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            prerelease,
        })
    }

    /// Whether this version carries a pre-release component
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// Next patch version: patch + 1, pre-release cleared
    pub fn increment_patch(&self) -> Self {
        SemanticVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch + 1,
            prerelease: Vec::new(),
        }
    }

    /// Next pre-release version: the embedded trailing number of the first
    /// pre-release identifier is bumped ("alpha1" becomes "alpha2", "rc9"
    /// becomes "rc10"), without inserting a separator or padding.
    ///
    /// The identifier must consist of a (possibly empty) non-digit prefix
    /// followed by a trailing digit run; anything else is an error rather
    /// than a silently unchanged identifier.
    pub fn increment_prerelease(&self) -> Result<Self> {
        let first = self.prerelease.first().ok_or_else(|| {
            MonorepoHelperError::version(format!("'{}' has no pre-release component", self))
        })?;

        let text = first.to_string();
        let (prefix, digits) = split_trailing_digits(&text).ok_or_else(|| {
            MonorepoHelperError::version(format!(
                "Pre-release identifier '{}' has no trailing number to increment",
                text
            ))
        })?;
        let number = digits.parse::<u64>().map_err(|_| {
            MonorepoHelperError::version(format!(
                "Pre-release number '{}' is out of range",
                digits
            ))
        })?;

        let identifier = if prefix.is_empty() {
            Identifier::Numeric(number + 1)
        } else {
            Identifier::AlphaNumeric(format!("{}{}", prefix, number + 1))
        };

        Ok(SemanticVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            prerelease: vec![identifier],
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for (i, identifier) in self.prerelease.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { '-' } else { '.' }, identifier)?;
        }
        Ok(())
    }
}

fn parse_identifiers(tag: &str, suffix: &str) -> Result<Vec<Identifier>> {
    suffix
        .split('.')
        .map(|segment| {
            if segment.is_empty() {
                Err(MonorepoHelperError::version(format!(
                    "'{}' contains an empty pre-release identifier",
                    tag
                )))
            } else if segment.chars().all(|c| c.is_ascii_digit()) {
                segment.parse::<u64>().map(Identifier::Numeric).map_err(|_| {
                    MonorepoHelperError::version(format!(
                        "Pre-release number '{}' is out of range",
                        segment
                    ))
                })
            } else if segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                Ok(Identifier::AlphaNumeric(segment.to_string()))
            } else {
                Err(MonorepoHelperError::version(format!(
                    "Invalid pre-release identifier: '{}'",
                    segment
                )))
            }
        })
        .collect()
}

/// Split an identifier into its non-digit prefix and trailing digit run.
///
/// Returns `None` when there is no trailing digit run, or when the prefix
/// itself contains digits ("a1b2" is not prefix+number shaped).
fn split_trailing_digits(s: &str) -> Option<(&str, &str)> {
    // ASCII digits are single bytes, so byte arithmetic is safe here.
    let digit_run = s.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    let (prefix, digits) = s.split_at(s.len() - digit_run);
    if digits.is_empty() || prefix.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((prefix, digits))
}
