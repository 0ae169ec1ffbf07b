//! Java platforms and platform selection.

use serde::Serialize;
use std::fmt;

use crate::{Error, Result};

/// Environment variable listing installed platforms for [`StaticPlatformProvider::from_env`].
///
/// Format: `name=version` pairs separated by `,`, e.g. `jdk-17=17,jdk-21=21`.
pub const JAVA_PLATFORMS_ENV: &str = "GPROPS_JAVA_PLATFORMS";

/// An installed Java platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JavaPlatform {
    pub name: String,
    pub version: String,
}

impl JavaPlatform {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn id(&self) -> PlatformId {
        PlatformId::new(&self.name, &self.version)
    }
}

impl fmt::Display for JavaPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.version)
    }
}

/// A requested platform as stored in settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlatformId {
    pub name: String,
    pub version: String,
}

impl PlatformId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name@version` or a bare version.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            Some(_) => Err(Error::InvalidInput(format!("Invalid platform '{}'", s))),
            None if s.is_empty() => Err(Error::InvalidInput("Empty platform".to_string())),
            None => Ok(Self::new("", s)),
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}

/// The installed platforms.
pub trait PlatformProvider: Send + Sync {
    fn platforms(&self) -> Vec<JavaPlatform>;

    /// Platform used when nothing else matches.
    fn default_platform(&self) -> Option<JavaPlatform> {
        self.platforms().into_iter().next()
    }
}

/// A fixed list of platforms; the first one is the default.
#[derive(Debug, Clone, Default)]
pub struct StaticPlatformProvider {
    platforms: Vec<JavaPlatform>,
}

impl StaticPlatformProvider {
    pub fn new(platforms: Vec<JavaPlatform>) -> Self {
        Self { platforms }
    }

    /// Platforms listed in [`JAVA_PLATFORMS_ENV`].
    pub fn from_env() -> Self {
        let platforms = std::env::var(JAVA_PLATFORMS_ENV)
            .map(|value| parse_platform_list(&value))
            .unwrap_or_default();
        Self::new(platforms)
    }
}

impl PlatformProvider for StaticPlatformProvider {
    fn platforms(&self) -> Vec<JavaPlatform> {
        self.platforms.clone()
    }
}

fn parse_platform_list(value: &str) -> Vec<JavaPlatform> {
    value
        .split(',')
        .filter_map(|entry| {
            let (name, version) = entry.trim().split_once('=')?;
            if name.is_empty() || version.is_empty() {
                tracing::warn!(entry = %entry, "Ignoring malformed platform entry");
                return None;
            }
            Some(JavaPlatform::new(name.trim(), version.trim()))
        })
        .collect()
}

/// Preference among platforms with the same version.
///
/// Platforms whose name starts with an earlier prefix are preferred;
/// the rest keep the provider's order.
#[derive(Debug, Clone, Default)]
pub struct PlatformOrder {
    preferred_prefixes: Vec<String>,
}

impl PlatformOrder {
    pub fn new(preferred_prefixes: Vec<String>) -> Self {
        Self { preferred_prefixes }
    }

    fn rank(&self, platform: &JavaPlatform) -> usize {
        self.preferred_prefixes
            .iter()
            .position(|prefix| platform.name.starts_with(prefix.as_str()))
            .unwrap_or(self.preferred_prefixes.len())
    }

    /// `platforms` sorted by preference (stable).
    pub fn sort(&self, mut platforms: Vec<JavaPlatform>) -> Vec<JavaPlatform> {
        platforms.sort_by_key(|p| self.rank(p));
        platforms
    }
}

/// Compare version strings numerically by dot-separated parts
/// (`1.8` < `11` < `17.0.2`). Non-numeric parts compare as text.
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering.is_ne() {
                    return ordering;
                }
            }
        }
    }
}

/// Pick the installed platform for `id`.
///
/// In order: exact name and version; the preferred platform with the same
/// version; the preferred platform with the lowest version at least the
/// requested one; the provider's default.
pub fn select_platform(
    id: &PlatformId,
    provider: &dyn PlatformProvider,
    order: &PlatformOrder,
) -> Option<JavaPlatform> {
    let installed = order.sort(provider.platforms());

    if let Some(exact) = installed
        .iter()
        .find(|p| p.name == id.name && p.version == id.version)
    {
        return Some(exact.clone());
    }
    if let Some(same) = installed
        .iter()
        .find(|p| compare_versions(&p.version, &id.version).is_eq())
    {
        return Some(same.clone());
    }
    let newer = installed
        .iter()
        .filter(|p| compare_versions(&p.version, &id.version).is_ge())
        .min_by(|a, b| compare_versions(&a.version, &b.version));
    if let Some(newer) = newer {
        return Some(newer.clone());
    }

    let fallback = provider.default_platform();
    tracing::debug!(
        requested = %id,
        fallback = ?fallback.as_ref().map(|p| p.name.as_str()),
        "No matching Java platform"
    );
    fallback
}
