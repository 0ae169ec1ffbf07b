//! Gradle versions and what they support.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A Gradle release version such as `8.5`, `7.6.1` or `8.6-rc-1`.
///
/// Ordering compares the numeric parts; a pre-release sorts before its
/// release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GradleVersion {
    major: u32,
    minor: u32,
    patch: u32,
    suffix: Option<String>,
}

impl GradleVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: None,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (numbers, suffix) = match s.split_once('-') {
            Some((numbers, suffix)) => (numbers, Some(suffix.to_string())),
            None => (s, None),
        };
        let invalid = || Error::InvalidInput(format!("Invalid Gradle version '{}'", s));
        let mut parts = numbers.split('.');
        let mut next = |required: bool| -> Result<u32> {
            match parts.next() {
                Some(p) => p.parse().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };
        let major = next(true)?;
        let minor = next(true)?;
        let patch = next(false)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self {
            major,
            minor,
            patch,
            suffix,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn is_prerelease(&self) -> bool {
        self.suffix.is_some()
    }

    /// Whether this version has `capability`.
    pub fn supports(&self, capability: GradleCapability) -> bool {
        self.base() >= capability.minimum_version()
    }

    fn base(&self) -> GradleVersion {
        GradleVersion::new(self.major, self.minor, self.patch)
    }
}

impl Ord for GradleVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.suffix, &other.suffix) {
                (None, None) => std::cmp::Ordering::Equal,
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for GradleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GradleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        if let Some(suffix) = &self.suffix {
            write!(f, "-{}", suffix)?;
        }
        Ok(())
    }
}

impl FromStr for GradleVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Features that only some Gradle versions have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradleCapability {
    /// Custom tooling API models.
    ToolingApiModels,
    /// Included builds.
    CompositeBuilds,
    /// The configuration cache.
    ConfigurationCache,
}

impl GradleCapability {
    pub const ALL: [GradleCapability; 3] = [
        GradleCapability::ToolingApiModels,
        GradleCapability::CompositeBuilds,
        GradleCapability::ConfigurationCache,
    ];

    /// First version with the capability.
    pub const fn minimum_version(&self) -> GradleVersion {
        match self {
            GradleCapability::ToolingApiModels => GradleVersion::new(1, 6, 0),
            GradleCapability::CompositeBuilds => GradleVersion::new(3, 1, 0),
            GradleCapability::ConfigurationCache => GradleVersion::new(6, 6, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GradleCapability::ToolingApiModels => "tooling-api-models",
            GradleCapability::CompositeBuilds => "composite-builds",
            GradleCapability::ConfigurationCache => "configuration-cache",
        }
    }
}

impl fmt::Display for GradleCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
