//! Project properties and tool configuration.
//!
//! ## Project properties
//!
//! [`ProjectProperties`] defines the standard settings of a Gradle project
//! (source level, platforms, Gradle location, daemon timeout, JVM arguments,
//! ...). Each one is stored as an element of the profile's settings file:
//!
//! - Default profile: `<project>/gradle-props.xml`
//! - Shared profile: `<project>/.gradle-props/profiles/<name>.xml`
//! - Private profile: `<data-dir>/gradle-props/<project-hash>/profiles/<name>.xml`
//!
//! ## Precedence
//!
//! For the project directory: CLI flag > `GPROPS_PROJECT` > current directory.
//! For property values: selected profile, merged with the default profile,
//! then the property's built-in default.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    DATA_DIR_ENV, PROJECT_ENV, Resolved, ValueSource, open_persister, resolve_data_dir,
    resolve_project_dir, value_source,
};
pub use schema::{
    ModelLoadingStrategy, OutputFormat, ProjectProperties, PropertyReport, TextProperty,
};
