//! Voxnote license diagnostics and startup gate.
//!
//! Usage:
//!   voxnote-licctl status              resolve and print the app state
//!   voxnote-licctl verify              print the raw technical status
//!   voxnote-licctl machine-id          print this machine's fingerprint
//!
//! `status` exits 0 when usage is allowed and 1 when blocked, so it
//! doubles as a startup gate for the backend launcher.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use voxnote_license::{app_state, generate_machine_id, verify_license, LicensePaths};

#[derive(Parser, Debug)]
#[command(name = "voxnote-licctl")]
#[command(about = "License diagnostics and startup gate for Voxnote")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and print the user-facing app state
    Status {
        #[command(flatten)]
        paths: PathArgs,
        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the raw technical status and reason (operator diagnostics)
    Verify {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Print this machine's fingerprint (needed to issue a license)
    MachineId,
}

#[derive(clap::Args, Debug)]
struct PathArgs {
    /// Path to the license file
    #[arg(short, long, default_value = "license.lic")]
    license: PathBuf,

    /// Path to the Ed25519 public key (default: keys/public.key next
    /// to the executable)
    #[arg(long)]
    public_key: Option<PathBuf>,

    /// Path to the last-run marker file (default: per-user data dir)
    #[arg(long)]
    marker: Option<PathBuf>,
}

impl PathArgs {
    fn resolve(self) -> LicensePaths {
        let mut paths = LicensePaths::resolve(self.license);
        if let Some(public_key) = self.public_key {
            paths.public_key = public_key;
        }
        if let Some(marker) = self.marker {
            paths.marker = marker;
        }
        paths
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match args.command {
        Command::Status { paths, json } => {
            let record = app_state(&paths.resolve());
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("State:          {:?}", record.state);
                println!("Allow usage:    {}", record.allow_usage);
                println!("Show warning:   {}", record.show_warning);
                println!("Message:        {}", record.user_message);
                if let Some(days) = record.days_remaining {
                    println!("Days remaining: {days}");
                }
            }
            if record.should_block() {
                return Ok(ExitCode::from(1));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { paths } => {
            let verification = verify_license(&paths.resolve());
            println!("Status: {}", verification.status.as_str());
            println!("Reason: {}", verification.reason);
            if verification.status.is_valid() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
        Command::MachineId => {
            println!("{}", generate_machine_id());
            Ok(ExitCode::SUCCESS)
        }
    }
}
