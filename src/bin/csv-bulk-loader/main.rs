//! Command-line front end: connect, manage indices and load CSV files.
//!
//! ```bash
//! csv-bulk-loader --url https://localhost:9200 create "Incident Report" incidents.csv
//! csv-bulk-loader upload more.csv --index incident_report_20240501
//! csv-bulk-loader list
//! ```

mod progress;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

use csv_bulk_loader::config::{ConnectionConfig, FileConfigStore};
use csv_bulk_loader::execution::{RetryPolicy, UploadOptions, DEFAULT_CHUNK_LINES};
use csv_bulk_loader::interaction::{NonInteractive, Prompter};
use csv_bulk_loader::pipeline::{load_csv, LoadOptions, LoadReport, TimestampSelection};
use csv_bulk_loader::store::{
    ensure_connected, ConnectedSession, HttpTransport, HttpTransportOptions, IndexManager,
};
use csv_bulk_loader::{LoaderError, LoaderResult};

use progress::ProgressObserver;
use terminal::TerminalPrompter;

/// Load CSV files into Elasticsearch through the bulk API
#[derive(Parser, Debug)]
#[command(name = "csv-bulk-loader", version)]
struct Cli {
    /// Connection config file (KEY=value lines), rewritten after a successful connection
    #[arg(long, default_value = "elk-config.txt")]
    config: PathBuf,

    /// Store endpoint, e.g. https://localhost:9200
    #[arg(long, env = "ELASTICSEARCH_URL")]
    url: Option<String>,

    /// Basic-auth username
    #[arg(long, env = "ELASTICSEARCH_USERNAME")]
    username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "ELASTICSEARCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Accept invalid TLS certificates (self-signed clusters)
    #[arg(long)]
    insecure: bool,

    /// Fail instead of prompting on the terminal
    #[arg(long)]
    non_interactive: bool,

    /// Only log warnings and errors; hide progress bars
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a dated index with a timestamp mapping and load a CSV file into it
    Create {
        /// Base name; sanitized and suffixed with today's date
        name: String,
        csv: PathBuf,
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Load a CSV file into an existing index
    Upload {
        csv: PathBuf,
        /// Target index; chosen from the index list when omitted
        #[arg(long)]
        index: Option<String>,
        #[command(flatten)]
        load: LoadArgs,
    },

    /// List indices (system and log indices excluded), oldest date suffix first
    List,

    /// Delete an index
    Delete {
        /// Index to delete; chosen from the index list when omitted
        index: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Timestamp column, as named in the file
    #[arg(long, conflicts_with_all = ["guess_timestamp", "no_timestamp"])]
    timestamp_column: Option<String>,

    /// Use the guessed timestamp column without asking
    #[arg(long, conflicts_with = "no_timestamp")]
    guess_timestamp: bool,

    /// Do not add a normalized timestamp field
    #[arg(long)]
    no_timestamp: bool,

    /// Lines per bulk request (two lines per document)
    #[arg(long, default_value_t = DEFAULT_CHUNK_LINES)]
    chunk_lines: usize,

    /// Attempts per chunk before the upload is abandoned
    #[arg(long, default_value_t = 30)]
    max_retries: u32,

    /// Delay between attempts in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Directory for the temporary bulk file
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
}

impl LoadArgs {
    fn to_options(&self, interactive: bool) -> LoadOptions {
        let timestamp = match &self.timestamp_column {
            Some(column) => TimestampSelection::Named(column.clone()),
            None if self.no_timestamp => TimestampSelection::Disabled,
            None if self.guess_timestamp || !interactive => TimestampSelection::Guess,
            None => TimestampSelection::Interactive,
        };
        LoadOptions {
            timestamp,
            artifact_dir: self.artifact_dir.clone(),
            upload: UploadOptions {
                chunk_line_count: self.chunk_lines,
                retry: RetryPolicy::fixed(
                    self.max_retries,
                    Duration::from_millis(self.retry_delay_ms),
                ),
                ..UploadOptions::default()
            },
            ..LoadOptions::default()
        }
    }
}

fn init_tracing(quiet: bool) {
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "csv_bulk_loader=info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> LoaderResult<ExitCode> {
    let interactive = !cli.non_interactive;
    let mut prompter: Box<dyn Prompter> = if interactive {
        Box::new(TerminalPrompter)
    } else {
        Box::new(NonInteractive)
    };

    let transport = HttpTransport::new(&HttpTransportOptions {
        accept_invalid_certs: cli.insecure,
        ..HttpTransportOptions::default()
    })?;
    let session = connect(&cli, &transport, prompter.as_mut())?;
    let indices = IndexManager::new(&transport, &session);

    match cli.command {
        Command::Create { name, csv, load } => {
            let index = indices.create_with_mapping(&name)?;
            println!("Created index {index}");
            let observer = ProgressObserver::new(cli.quiet);
            let report = load_csv(
                &transport,
                &session,
                &csv,
                &index,
                prompter.as_mut(),
                &observer,
                &load.to_options(interactive),
            )?;
            Ok(print_report(&report))
        }
        Command::Upload { csv, index, load } => {
            let index = match index {
                Some(index) => index,
                None => choose_index(&indices, interactive)?,
            };
            let observer = ProgressObserver::new(cli.quiet);
            let report = load_csv(
                &transport,
                &session,
                &csv,
                &index,
                prompter.as_mut(),
                &observer,
                &load.to_options(interactive),
            )?;
            Ok(print_report(&report))
        }
        Command::List => {
            let listed = indices.list()?;
            if listed.is_empty() {
                println!("No indices found");
            }
            for summary in &listed {
                println!(
                    "{:<48} {:>12} {:>10}",
                    summary.index,
                    summary
                        .docs_count
                        .map_or_else(|| "-".to_string(), |n| n.to_string()),
                    summary.store_size.as_deref().unwrap_or("-"),
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { index, yes } => {
            let index = match index {
                Some(index) => index,
                None => choose_index(&indices, interactive)?,
            };
            if !yes {
                if !interactive {
                    return Err(LoaderError::Interaction {
                        message: "deleting without --yes requires interactive input".to_string(),
                    });
                }
                if !terminal::confirm(&format!("Delete index '{index}'?"))? {
                    println!("Deletion cancelled");
                    return Ok(ExitCode::SUCCESS);
                }
            }
            indices.delete(&index)?;
            println!("Deleted index {index}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Build the session from the config file and flags, then wait for a healthy store.
fn connect(
    cli: &Cli,
    transport: &HttpTransport,
    prompter: &mut dyn Prompter,
) -> LoaderResult<ConnectedSession> {
    let mut config = ConnectionConfig::load(&cli.config)?.unwrap_or_default();
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(username) = &cli.username {
        config.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.password = SecretString::from(password.clone());
    }
    if config.url.trim().is_empty() {
        if cli.non_interactive {
            return Err(LoaderError::Config {
                message: format!(
                    "no endpoint in {} and neither --url nor ELASTICSEARCH_URL is set",
                    cli.config.display()
                ),
            });
        }
        config.url = prompter.endpoint("", "no endpoint configured")?;
    }

    let store = FileConfigStore::new(cli.config.clone());
    ensure_connected(transport, config.to_session(), prompter, &store)
}

fn choose_index(
    indices: &IndexManager<'_, HttpTransport>,
    interactive: bool,
) -> LoaderResult<String> {
    if !interactive {
        return Err(LoaderError::Interaction {
            message: "choosing an index requires interactive input; pass the index name"
                .to_string(),
        });
    }
    let listed = indices.list()?;
    if listed.is_empty() {
        return Err(LoaderError::InvalidOptions {
            message: "no eligible indices found".to_string(),
        });
    }
    terminal::choose_index(&listed)
}

fn print_report(report: &LoadReport) -> ExitCode {
    let upload = &report.upload;
    println!(
        "{}: {} rows read, {} documents delivered in {} chunks",
        report.index, report.rows, upload.actions_delivered, upload.chunks_delivered
    );
    if let Some(column) = &report.timestamp_column {
        println!(
            "timestamp column '{column}': {} normalized, {} unparseable",
            report.timestamps_normalized, report.timestamps_failed
        );
    }
    if report.skipped_records > 0 {
        println!("{} malformed records skipped", report.skipped_records);
    }
    if upload.item_failures > 0 {
        println!("{} documents rejected by the store", upload.item_failures);
    }
    match &upload.failure {
        None => ExitCode::SUCCESS,
        Some(failure) => {
            println!(
                "upload stopped at chunk {} after {} attempts: {}",
                failure.sequence + 1,
                failure.attempts,
                failure.last_error
            );
            ExitCode::FAILURE
        }
    }
}
