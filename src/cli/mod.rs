//! CLI argument definitions for gprops.

use clap::{Args, Parser, Subcommand};

/// gprops - Layered configuration profiles for Gradle projects.
///
/// Start with `gprops properties` to see the effective settings of a project.
#[derive(Parser, Debug)]
#[command(name = "gprops")]
#[command(author, about = "Inspect and edit layered Gradle project settings", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GPROPS_GIT_COMMIT"), ")"))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if gprops was started in <path> instead of the current directory.
    /// Can also be set via GPROPS_PROJECT environment variable.
    #[arg(short = 'C', long = "project", global = true)]
    pub project_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Selects the profile a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArg {
    /// Profile to use: `name`, `group/name` or `private/name` (default profile if omitted)
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<String>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the profiles of the project
    Profiles,

    /// Show every standard property with its effective value
    Properties {
        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Show the effective value of a property and where it came from
    Get {
        /// Property name (e.g., daemon-timeout, jvm-args)
        property: String,

        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Store a property value in a profile
    Set {
        /// Property name (e.g., daemon-timeout, jvm-args)
        property: String,

        /// New value; jvm-args takes whitespace-separated arguments,
        /// license-header an XML element, platforms `name@version` or a version
        value: String,

        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Remove a property value from a profile
    Unset {
        /// Property name
        property: String,

        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Auxiliary configuration (elements no standard property claims)
    Aux {
        #[command(subcommand)]
        command: AuxCommands,
    },

    /// Rewrite a profile's settings file in sorted form
    Normalize {
        #[command(flatten)]
        profile: ProfileArg,

        /// Write Windows line endings
        #[arg(long, conflicts_with = "lf")]
        crlf: bool,

        /// Write Unix line endings
        #[arg(long)]
        lf: bool,
    },
}

/// Auxiliary configuration subcommands
#[derive(Subcommand, Debug)]
pub enum AuxCommands {
    /// List auxiliary elements
    List {
        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Print an auxiliary element as XML
    Get {
        /// Element name, `{namespace}name` for namespaced elements
        key: String,

        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Store an auxiliary element given as XML text
    Set {
        /// The element, e.g. `<vendor-ext><flag>on</flag></vendor-ext>`
        xml: String,

        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Remove an auxiliary element
    Remove {
        /// Element name, `{namespace}name` for namespaced elements
        key: String,

        #[command(flatten)]
        profile: ProfileArg,
    },
}

impl Commands {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Profiles => "profiles",
            Commands::Properties { .. } => "properties",
            Commands::Get { .. } => "get",
            Commands::Set { .. } => "set",
            Commands::Unset { .. } => "unset",
            Commands::Aux { command } => match command {
                AuxCommands::List { .. } => "aux list",
                AuxCommands::Get { .. } => "aux get",
                AuxCommands::Set { .. } => "aux set",
                AuxCommands::Remove { .. } => "aux remove",
            },
            Commands::Normalize { .. } => "normalize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_with_profile() {
        let cli = Cli::parse_from(["gprops", "set", "daemon-timeout", "10", "--profile", "debug"]);
        match cli.command {
            Commands::Set {
                property,
                value,
                profile,
            } => {
                assert_eq!(property, "daemon-timeout");
                assert_eq!(value, "10");
                assert_eq!(profile.profile.as_deref(), Some("debug"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["gprops", "profiles", "-H", "-C", "/tmp/project"]);
        assert!(cli.human_readable);
        assert_eq!(cli.project_path, Some(std::path::PathBuf::from("/tmp/project")));
        assert_eq!(cli.command.name(), "profiles");
    }

    #[test]
    fn test_normalize_line_endings_conflict() {
        assert!(Cli::try_parse_from(["gprops", "normalize", "--crlf", "--lf"]).is_err());
    }
}
