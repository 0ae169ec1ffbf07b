//! Where Gradle comes from.
//!
//! String form, as stored in settings files:
//!
//! | variant | form |
//! |---|---|
//! | `Default` | `?DEFAULT` |
//! | `Version` | `?VER=8.5` |
//! | `Distribution` | `?DIST=https://services.gradle.org/distributions/gradle-8.5-bin.zip` |
//! | `Directory` | `/opt/gradle` (or `?DIR=/opt/gradle`) |
//!
//! Payloads may contain `${...}` placeholders, expanded by
//! [`GradleLocation::resolve`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::resolver::StringResolver;
use crate::{Error, Result};

const TAG_PREFIX: char = '?';

/// Receives a location in whatever form it takes.
pub trait GradleLocationApplier {
    fn apply_default(&mut self);
    fn apply_version(&mut self, version: &str);
    fn apply_distribution(&mut self, uri: &str);
    fn apply_directory(&mut self, dir: &str);
}

/// The Gradle installation a project builds with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GradleLocation {
    /// Whatever the project's wrapper (or the environment) provides.
    #[default]
    Default,
    /// A released version, downloaded as needed.
    Version(String),
    /// A distribution archive.
    Distribution(String),
    /// An installation directory.
    Directory(String),
}

impl GradleLocation {
    pub const DEFAULT_TYPE: &'static str = "DEFAULT";
    pub const VERSION_TYPE: &'static str = "VER";
    pub const DISTRIBUTION_TYPE: &'static str = "DIST";
    pub const DIRECTORY_TYPE: &'static str = "DIR";

    /// Discriminator used in the string form.
    pub fn unique_type_name(&self) -> &'static str {
        match self {
            GradleLocation::Default => Self::DEFAULT_TYPE,
            GradleLocation::Version(_) => Self::VERSION_TYPE,
            GradleLocation::Distribution(_) => Self::DISTRIBUTION_TYPE,
            GradleLocation::Directory(_) => Self::DIRECTORY_TYPE,
        }
    }

    /// The payload, empty for `Default`.
    pub fn payload(&self) -> &str {
        match self {
            GradleLocation::Default => "",
            GradleLocation::Version(s)
            | GradleLocation::Distribution(s)
            | GradleLocation::Directory(s) => s,
        }
    }

    /// The string form.
    pub fn as_string(&self) -> String {
        match self {
            GradleLocation::Default => format!("{}{}", TAG_PREFIX, Self::DEFAULT_TYPE),
            GradleLocation::Directory(dir) if is_plain_directory(dir) => dir.clone(),
            other => format!(
                "{}{}={}",
                TAG_PREFIX,
                other.unique_type_name(),
                other.payload()
            ),
        }
    }

    /// Build a location from its discriminator and payload.
    pub fn from_type_name(type_name: &str, payload: &str) -> Result<Self> {
        match type_name {
            Self::DEFAULT_TYPE => Ok(GradleLocation::Default),
            Self::VERSION_TYPE => Ok(GradleLocation::Version(payload.to_string())),
            Self::DISTRIBUTION_TYPE => Ok(GradleLocation::Distribution(payload.to_string())),
            Self::DIRECTORY_TYPE => Ok(GradleLocation::Directory(payload.to_string())),
            other => Err(Error::InvalidInput(format!(
                "Unknown Gradle location type '{}'",
                other
            ))),
        }
    }

    /// Parse the string form.
    ///
    /// Blank text is `Default`; untagged text is a directory, trimmed. The
    /// payload of tagged text is taken as is.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim_start();
        if s.trim_end().is_empty() {
            return Ok(GradleLocation::Default);
        }
        match s.strip_prefix(TAG_PREFIX) {
            None => Ok(GradleLocation::Directory(s.trim_end().to_string())),
            Some(tagged) => match tagged.split_once('=') {
                Some((type_name, payload)) => Self::from_type_name(type_name, payload),
                None => Self::from_type_name(tagged, ""),
            },
        }
    }

    /// Hand this location to `applier`.
    pub fn apply_location(&self, applier: &mut dyn GradleLocationApplier) {
        match self {
            GradleLocation::Default => applier.apply_default(),
            GradleLocation::Version(version) => applier.apply_version(version),
            GradleLocation::Distribution(uri) => applier.apply_distribution(uri),
            GradleLocation::Directory(dir) => applier.apply_directory(dir),
        }
    }

    /// Expand placeholders in the payload.
    ///
    /// `None` when a placeholder cannot be resolved.
    pub fn resolve(&self, resolver: &dyn StringResolver) -> Option<GradleLocation> {
        let payload = resolver.resolve(self.payload())?;
        Some(match self {
            GradleLocation::Default => GradleLocation::Default,
            GradleLocation::Version(_) => GradleLocation::Version(payload),
            GradleLocation::Distribution(_) => GradleLocation::Distribution(payload),
            GradleLocation::Directory(_) => GradleLocation::Directory(payload),
        })
    }

    /// Installation directory, for `Directory` locations.
    pub fn directory(&self) -> Option<PathBuf> {
        match self {
            GradleLocation::Directory(dir) => Some(PathBuf::from(dir)),
            _ => None,
        }
    }
}

impl fmt::Display for GradleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl FromStr for GradleLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Whether `dir` reads back as itself when written untagged.
fn is_plain_directory(dir: &str) -> bool {
    !dir.is_empty() && !dir.starts_with(TAG_PREFIX) && dir.trim() == dir
}
