//! Gradle-side collaborators of the settings engine.
//!
//! - [`GradleLocation`] - which Gradle installation to use
//! - [`GradleVersion`] / [`GradleCapability`] - what a version can do
//! - [`JavaPlatform`] and [`select_platform`] - which JDK to run with
//! - [`StringResolver`] / [`ProjectContext`] - placeholder expansion

mod location;
mod platform;
mod resolver;
mod version;

pub use location::{GradleLocation, GradleLocationApplier};
pub use platform::{
    JAVA_PLATFORMS_ENV, JavaPlatform, PlatformId, PlatformOrder, PlatformProvider,
    StaticPlatformProvider, compare_versions, select_platform,
};
pub use resolver::{DirectoryProject, PlaceholderResolver, ProjectContext, StringResolver};
pub use version::{GradleCapability, GradleVersion};
