//! Main CLI application

use crate::config::{
    load_definition_auto, load_definition_file, validate_to, Manifest, ProjectDefinition, Stage,
};
use crate::error::DevopsError;
use crate::runner::{
    ambient_snapshot, is_running_in_ci, DefaultExecutor, LifecycleController, OperationRunner,
};
use anyhow::Context as _;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const ABOUT: &str = "DevOps: Simplifying your CI/CD pipelines.";

/// Exit code used when a run was interrupted
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Build the clap command tree
pub fn build_command() -> Command {
    let mut cmd = Command::new("devops")
        .version(crate::VERSION)
        .about(ABOUT)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the devops-definition.yaml file")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64))
                .help("Cancel the operation after this many seconds")
                .global(true),
        );

    for stage in Stage::ALL {
        let about = match stage {
            Stage::Install => "Run the install operations",
            Stage::Test => "Run the test operations",
            Stage::Build => "Run the build operations",
        };
        cmd = cmd.subcommand(Command::new(stage.as_str()).about(about));
    }

    cmd.subcommand(
        Command::new("doctor")
            .about("Validate your configuration")
            .long_about("Run checks on your configuration file to ensure it is ready for use."),
    )
    .subcommand(
        Command::new("manifest")
            .about("Print the project manifest as JSON")
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("PATH")
                    .value_parser(value_parser!(PathBuf))
                    .help("Write the manifest to a file instead of stdout"),
            ),
    )
}

/// Map the repeated -v flag to a log filter
fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("devops={}", log_level(verbosity))));

    // A second initialization (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load(matches: &ArgMatches) -> Result<(ProjectDefinition, PathBuf), DevopsError> {
    match matches.get_one::<PathBuf>("file") {
        Some(path) => Ok((load_definition_file(path)?, path.clone())),
        None => load_definition_auto(),
    }
}

/// Run the CLI with the process arguments
pub async fn run() -> anyhow::Result<()> {
    run_with_args(std::env::args_os()).await
}

/// Run the CLI with explicit arguments
pub async fn run_with_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // Help, version and usage errors are printed by clap with its own exit code
    let matches = build_command()
        .try_get_matches_from(args)
        .unwrap_or_else(|e| e.exit());
    init_logging(matches.get_count("verbose"));

    let (definition, path) = load(&matches)?;
    debug!(path = %path.display(), "loaded project definition");

    let ambient = ambient_snapshot();
    if is_running_in_ci(&ambient) {
        debug!("running in a CI environment");
    }

    let timeout = matches.get_one::<u64>("timeout").copied();

    match matches.subcommand() {
        Some(("doctor", _)) => doctor(&definition),
        Some(("manifest", sub)) => manifest(&definition, sub.get_one::<PathBuf>("output")),
        Some((name, _)) => {
            let stage = Stage::ALL
                .into_iter()
                .find(|s| s.as_str() == name)
                .with_context(|| format!("unknown command '{}'", name))?;
            run_stage(&definition, stage, &ambient, timeout).await
        }
        None => Ok(()),
    }
}

fn doctor(definition: &ProjectDefinition) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "===== DEVOPS DOCTOR =====")?;
    validate_to(definition, &mut out)?;
    Ok(())
}

fn manifest(definition: &ProjectDefinition, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let json = Manifest::from_definition(definition).to_json()?;
    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))
                .with_context(|| format!("failed to write manifest to {}", path.display()))?;
            println!("Manifest written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn run_stage(
    definition: &ProjectDefinition,
    stage: Stage,
    ambient: &[(OsString, OsString)],
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let lifecycle = LifecycleController::start(&CancellationToken::new())
        .context("failed to install signal handlers")?;

    let mut ctx = lifecycle.context();
    if let Some(interpreter) = &definition.interpreter {
        ctx = ctx.with_interpreter(interpreter.clone());
    }
    if let Some(secs) = timeout {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    info!(stage = %stage, "running stage");
    let mut executor = DefaultExecutor::new();
    let result = OperationRunner::stdio()
        .run_stage(&ctx, definition, stage, ambient, &mut executor)
        .await;
    lifecycle.shutdown().await;

    result.map_err(DevopsError::from).with_context(|| match stage {
        Stage::Install => "install failed",
        Stage::Test => "tests failed",
        Stage::Build => "build failed",
    })
}

/// Process exit code for a failed run
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DevopsError>() {
        Some(DevopsError::Execution(e)) if e.is_cancelled() => INTERRUPTED_EXIT_CODE,
        _ => 1,
    }
}
