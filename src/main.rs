//! gprops CLI - Layered configuration profiles for Gradle projects.

use clap::Parser;
use gradle_props::cli::{AuxCommands, Cli, Commands};
use gradle_props::commands::{self, Output, Session};
use gradle_props::config::resolve_project_dir;
use gradle_props::storage::LineSeparator;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`, `gradle_props=trace`).
const LOG_ENV: &str = "GPROPS_LOG";

fn main() {
    init_logging();

    let cli = Cli::parse();
    let human = cli.human_readable;
    let cmd_name = cli.command.name();

    let start = Instant::now();
    let result = run(cli);
    tracing::debug!(
        command = cmd_name,
        duration_ms = start.elapsed().as_millis() as u64,
        success = result.is_ok(),
        "Command finished"
    );

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Log to stderr so JSON on stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), gradle_props::Error> {
    let project = resolve_project_dir(cli.project_path.as_deref())?;
    tracing::debug!(
        project = %project.value.display(),
        source = %project.source,
        "Resolved project directory"
    );
    let session = Session::open(&project.value)?;
    run_command(cli.command, &session, cli.human_readable)
}

fn run_command(
    command: Commands,
    session: &Session,
    human: bool,
) -> Result<(), gradle_props::Error> {
    match command {
        Commands::Profiles => output(&commands::profiles(session)?, human),
        Commands::Properties { profile } => {
            output(&commands::properties(session, profile.profile.as_deref())?, human)
        }
        Commands::Get { property, profile } => output(
            &commands::get(session, &property, profile.profile.as_deref())?,
            human,
        ),
        Commands::Set {
            property,
            value,
            profile,
        } => output(
            &commands::set(session, &property, Some(&value), profile.profile.as_deref())?,
            human,
        ),
        Commands::Unset { property, profile } => output(
            &commands::set(session, &property, None, profile.profile.as_deref())?,
            human,
        ),
        Commands::Aux { command } => match command {
            AuxCommands::List { profile } => {
                output(&commands::aux_list(session, profile.profile.as_deref())?, human)
            }
            AuxCommands::Get { key, profile } => output(
                &commands::aux_get(session, &key, profile.profile.as_deref())?,
                human,
            ),
            AuxCommands::Set { xml, profile } => output(
                &commands::aux_set(session, &xml, profile.profile.as_deref())?,
                human,
            ),
            AuxCommands::Remove { key, profile } => output(
                &commands::aux_remove(session, &key, profile.profile.as_deref())?,
                human,
            ),
        },
        Commands::Normalize { profile, crlf, lf } => {
            let separator = match (crlf, lf) {
                (true, _) => Some(LineSeparator::CrLf),
                (_, true) => Some(LineSeparator::Lf),
                _ => None,
            };
            output(
                &commands::normalize(session, profile.profile.as_deref(), separator)?,
                human,
            )
        }
    }
    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
