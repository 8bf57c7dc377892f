use clap::Parser;

mod cli;
mod config_cmd;
mod context;
mod drift_report;

use cli::{Cli, Commands, ConfigCommands};
use zerb_core::ZerbError;

/// Map the closed error taxonomy to the exit-code bands from spec §6.
fn exit_code_for(err: &ZerbError) -> i32 {
    match err {
        ZerbError::LockExists { .. } => 3,
        ZerbError::Timeout(_) | ZerbError::Cancelled | ZerbError::SubprocessError { .. } => 2,
        ZerbError::PayloadTooLarge
        | ZerbError::ParseError { .. }
        | ZerbError::ValidationError { .. }
        | ZerbError::InjectionRejected(_)
        | ZerbError::OutsideHome(_)
        | ZerbError::NotInitialized => 1,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let exit_code = run(cli).await;
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    let root = match context::resolve_root(cli.root) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_code_for(&err);
        }
    };
    let home = match context::resolve_home() {
        Ok(home) => home,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_code_for(&err);
        }
    };
    let platform = context::platform();

    let result = dispatch(cli.command, &root, &platform, &home).await;
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            exit_code_for(&err)
        }
    }
}

async fn dispatch(
    command: Commands,
    root: &std::path::Path,
    platform: &zerb_platform::PlatformInfo,
    home: &std::path::Path,
) -> Result<i32, ZerbError> {
    match command {
        Commands::Status => {
            let all_ok = drift_report::run(root, platform, home).await?;
            Ok(if all_ok { 0 } else { 1 })
        }
        Commands::Sync => {
            let all_ok = drift_report::run(root, platform, home).await?;
            Ok(if all_ok { 0 } else { 1 })
        }
        Commands::Config { command } => match command {
            ConfigCommands::Add { paths, recursive, template, secrets, private, dry_run } => {
                config_cmd::add(root, platform, home, paths, recursive, template, secrets, private, dry_run)?;
                Ok(0)
            }
            ConfigCommands::Remove { paths, purge, dry_run } => {
                config_cmd::remove(root, platform, home, paths, purge, dry_run)?;
                Ok(0)
            }
            ConfigCommands::List => {
                config_cmd::list(root, platform, home)?;
                Ok(0)
            }
        },
    }
}
