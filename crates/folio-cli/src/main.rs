//! Folio CLI
//!
//! Command-line interface for folio - accounts, sessions and shared documents.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio_core::{Config, ServiceError};

mod commands;
mod output;
mod session_file;

use commands::admin::AdminCommandTable;
use commands::FolioService;
use output::{Output, OutputFormat};
use session_file::SessionFile;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - Multi-user documents with read-only sharing")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register { username: String, password: String },
    /// Log in and store the session
    Login { username: String, password: String },
    /// End the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Manage documents
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Run one JSON request read from stdin
    Call,
    /// Administrative commands (run without arguments to list them)
    Admin {
        /// Command index or name
        command: Option<String>,
        /// Command arguments
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DocCommands {
    /// Create an empty document
    #[command(alias = "new")]
    Create {
        /// Document title
        title: String,
    },
    /// List documents
    #[command(alias = "ls")]
    List {
        /// Only documents you own
        #[arg(long)]
        mine: bool,
        /// Only documents shared with you
        #[arg(long)]
        guest: bool,
    },
    /// Show a document
    Show {
        /// Document ID (full UUID or prefix)
        id: String,
    },
    /// Replace a document's content (from --content, --file, or stdin)
    Write {
        /// Document ID (full UUID or prefix)
        id: String,
        /// New content
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,
        /// Read new content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Rename a document
    Rename {
        /// Document ID (full UUID or prefix)
        id: String,
        /// New title
        title: String,
    },
    /// Delete a document
    #[command(alias = "rm")]
    Delete {
        /// Document ID (full UUID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Give another account read access
    Share {
        /// Document ID (full UUID or prefix)
        id: String,
        /// Guest username
        username: String,
    },
    /// Revoke another account's read access
    Unshare {
        /// Document ID (full UUID or prefix)
        id: String,
        /// Guest username
        username: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, max_content_length, log_level, hasher.*)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(service_err) = err.downcast_ref::<ServiceError>() {
                output.print_failure(service_err);
            } else if !commands::call::is_reported(&err) {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let session_file = SessionFile::new(config.session_file_path());
    let service = FolioService::open(config).context("Failed to open folio database")?;

    match cli.command {
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Register { username, password } => {
            commands::account::register(&service, username, password, output)
        }
        Commands::Login { username, password } => {
            commands::account::login(&service, &session_file, username, password, output)
        }
        Commands::Logout => commands::account::logout(&service, &session_file, output),
        Commands::Whoami => commands::account::whoami(&service, &session_file, output),
        Commands::Doc { command } => handle_doc_command(command, &service, &session_file, output),
        Commands::Call => commands::call::call(&service, output),
        Commands::Admin { command, args } => {
            let table = AdminCommandTable::standard();
            commands::admin::dispatch(&table, &service, command.as_deref(), &args, output)
        }
    }
}

fn handle_doc_command(
    command: DocCommands,
    service: &FolioService,
    session_file: &SessionFile,
    output: &Output,
) -> Result<()> {
    let session = session_file.require()?;

    match command {
        DocCommands::Create { title } => {
            commands::document::create(service, &session, title, output)
        }
        DocCommands::List { mine, guest } => {
            commands::document::list(service, &session, mine, guest, output)
        }
        DocCommands::Show { id } => commands::document::show(service, &session, id, output),
        DocCommands::Write { id, content, file } => {
            commands::document::write(service, &session, id, content, file, output)
        }
        DocCommands::Rename { id, title } => {
            commands::document::rename(service, &session, id, title, output)
        }
        DocCommands::Delete { id, yes } => {
            commands::document::delete(service, &session, id, yes, output)
        }
        DocCommands::Share { id, username } => {
            commands::document::share(service, &session, id, username, output)
        }
        DocCommands::Unshare { id, username } => {
            commands::document::unshare(service, &session, id, username, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize stderr logging
///
/// RUST_LOG wins when set; otherwise the configured level applies to the
/// folio crates.
fn init_logging(config: &Config) {
    let level = config.log_level();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("folio_core={},folio_cli={}", level, level)));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
