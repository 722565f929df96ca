//! xaregistry Inspection Tool
//!
//! Lists and verifies registry files left in a recovery directory. It only
//! reads files: nothing is locked, recovered or deleted.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use xaregistry::config::recovery_dir_for;
use xaregistry::recovery::list_registry_files;
use xaregistry::registry::parse_records;
use xaregistry::Xid;

/// xaregistry inspector
#[derive(Parser, Debug)]
#[command(name = "xaregistry-inspect")]
#[command(about = "Inspect XA recovery registry files")]
#[command(version)]
struct Args {
    /// Base directory (the one containing xa-recovery/)
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every registry file and its locators
    List,

    /// Check that every registry file parses; exit 1 if any is malformed
    Verify,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,xaregistry=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let dir = recovery_dir_for(&args.base_dir);

    tracing::info!("xaregistry-inspect v{}", xaregistry::VERSION);
    tracing::info!("Recovery directory: {}", dir.display());

    let names = match list_registry_files(&dir) {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Commands::List => list(&dir, &names),
        Commands::Verify => verify(&dir, &names),
    }
}

fn list(dir: &Path, names: &[String]) -> ExitCode {
    if names.is_empty() {
        println!("no registry files");
        return ExitCode::SUCCESS;
    }

    for name in names {
        match Xid::from_hex(name) {
            Ok(xid) => println!(
                "{} (format {}, gtrid {} bytes, bqual {} bytes)",
                name,
                xid.format_id(),
                xid.global_transaction_id().len(),
                xid.branch_qualifier().len()
            ),
            Err(_) => println!("{} (not an xid)", name),
        }

        match read_locators(&dir.join(name)) {
            Ok(locators) if locators.is_empty() => println!("    <empty>"),
            Ok(locators) => {
                for locator in locators {
                    println!("    {}", locator);
                }
            }
            Err(e) => println!("    error: {}", e),
        }
    }

    ExitCode::SUCCESS
}

fn verify(dir: &Path, names: &[String]) -> ExitCode {
    let mut malformed = 0;

    for name in names {
        match read_locators(&dir.join(name)) {
            Ok(locators) => println!("ok       {} ({} locators)", name, locators.len()),
            Err(e) => {
                malformed += 1;
                println!("MALFORMED {}: {}", name, e);
            }
        }
    }

    println!("{} files, {} malformed", names.len(), malformed);

    if malformed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn read_locators(path: &Path) -> Result<Vec<url::Url>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_records(&content, path)?)
}
