//! Palmkey CLI - palm-biometric registration and recognition tool.
//!
//! Every invocation writes exactly one JSON envelope to stdout; diagnostics
//! go to stderr. Exit code 0 means the call completed structurally (including
//! logical non-matches and expected domain failures reported in the
//! envelope); exit code 1 means a usage error or an unhandled internal fault.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use palmkey_core::{TemplateStore, DEFAULT_THRESHOLD};

mod commands;
mod detector;
mod response;

use response::{emit, FailureResponse};

#[derive(Parser)]
#[command(name = "palmkey")]
#[command(author, version, about = "Palm-biometric registration and recognition", long_about = None)]
struct Cli {
    /// Directory holding per-identity registration records
    #[arg(long, global = true, default_value = "palm_data", value_name = "DIR")]
    data_dir: PathBuf,

    /// Use the deterministic mock detector instead of a real service (testing only)
    #[arg(long, global = true)]
    mock: bool,

    /// Base URL of the HTTP keypoint detector service
    #[arg(long, global = true, value_name = "URL")]
    detector_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Detector selection shared by the commands that capture a palm.
pub struct DetectorArgs {
    pub mock: bool,
    pub detector_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the palm in an image under an identity
    Register {
        /// Path to the palm image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Identity to bind the palm to
        #[arg(value_name = "IDENTITY")]
        identity: String,
    },

    /// Recognize the palm in an image
    Recognize {
        /// Path to the palm image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Match only against this identity instead of scanning the store
        #[arg(value_name = "IDENTITY")]
        identity: Option<String>,

        /// Maximum acceptable distance for declaring a match
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },

    /// Delete the registration for an identity
    Delete {
        /// Identity whose registration should be removed
        #[arg(value_name = "IDENTITY")]
        identity: String,
    },

    /// List all registered identities
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit 1, per the command surface convention.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Unhandled internal fault: full detail on the side channel, a
            // generic envelope on stdout.
            error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("{}", format!("Error: {e:#}").red());
            let _ = emit(&FailureResponse::new(format!("Internal error: {e}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = Arc::new(TemplateStore::open(&cli.data_dir)?);
    let detector_args = DetectorArgs {
        mock: cli.mock,
        detector_url: cli.detector_url.clone(),
    };

    match cli.command {
        Commands::Register { image, identity } => {
            commands::register::execute(store, &detector_args, image, identity).await
        }
        Commands::Recognize {
            image,
            identity,
            threshold,
        } => commands::recognize::execute(store, &detector_args, image, identity, threshold).await,
        Commands::Delete { identity } => commands::delete::execute(store, identity),
        Commands::List => commands::list::execute(store),
    }
}
