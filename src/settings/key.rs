//! Profile identity.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Group whose profiles are kept outside the project directory.
pub const PRIVATE_GROUP: &str = "private";

const DEFAULT_DISPLAY: &str = "<default>";

/// Identifies a profile.
///
/// The shared default profile is the fallback of every named profile.
/// Named profiles may live in a group; the group `private` is stored per
/// user rather than in the project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ProfileKey {
    #[default]
    Default,
    Named {
        group: Option<String>,
        name: String,
    },
}

impl ProfileKey {
    /// A profile without group.
    pub fn named(name: &str) -> Result<Self> {
        validate_segment("profile name", name)?;
        Ok(ProfileKey::Named {
            group: None,
            name: name.to_string(),
        })
    }

    /// A profile in `group`.
    pub fn in_group(group: &str, name: &str) -> Result<Self> {
        validate_segment("profile group", group)?;
        validate_segment("profile name", name)?;
        Ok(ProfileKey::Named {
            group: Some(group.to_string()),
            name: name.to_string(),
        })
    }

    /// A per-user profile.
    pub fn private(name: &str) -> Result<Self> {
        Self::in_group(PRIVATE_GROUP, name)
    }

    /// Parse `""`/`<default>`, `name`, or `group/name`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == DEFAULT_DISPLAY {
            return Ok(ProfileKey::Default);
        }
        match s.split_once('/') {
            Some((group, name)) => Self::in_group(group, name),
            None => Self::named(s),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ProfileKey::Default)
    }

    pub fn is_private(&self) -> bool {
        self.group() == Some(PRIVATE_GROUP)
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            ProfileKey::Default => None,
            ProfileKey::Named { group, .. } => group.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ProfileKey::Default => None,
            ProfileKey::Named { name, .. } => Some(name),
        }
    }
}

fn validate_segment(what: &str, s: &str) -> Result<()> {
    let valid = !s.is_empty()
        && !s.starts_with('.')
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid {}: {:?} (use letters, digits, '-', '_' and '.')",
            what, s
        )))
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKey::Default => f.write_str(DEFAULT_DISPLAY),
            ProfileKey::Named {
                group: Some(group),
                name,
            } => write!(f, "{}/{}", group, name),
            ProfileKey::Named { group: None, name } => f.write_str(name),
        }
    }
}

impl FromStr for ProfileKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default() {
        assert_eq!(ProfileKey::parse("").unwrap(), ProfileKey::Default);
        assert_eq!(ProfileKey::parse("<default>").unwrap(), ProfileKey::Default);
        assert!(ProfileKey::Default.is_default());
    }

    #[test]
    fn test_parse_named_and_grouped() {
        let debug = ProfileKey::parse("debug").unwrap();
        assert_eq!(debug.name(), Some("debug"));
        assert_eq!(debug.group(), None);

        let ci = ProfileKey::parse("team/ci").unwrap();
        assert_eq!(ci.group(), Some("team"));
        assert_eq!(ci.name(), Some("ci"));

        assert!(ProfileKey::parse("private/mine").unwrap().is_private());
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["<default>", "debug", "team/ci", "private/mine"] {
            let key: ProfileKey = s.parse().unwrap();
            assert_eq!(key.to_string(), s);
        }
    }

    #[test]
    fn test_invalid_names_rejected() {
        for s in ["a/b/c", "../x", ".hidden", "sp ace", "a/"] {
            assert!(
                matches!(ProfileKey::parse(s), Err(Error::InvalidInput(_))),
                "{} should be rejected",
                s
            );
        }
    }
}
