// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use critica::app_config::{Config, LogLevel};
use critica::database::DatabaseConnection;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database file and initialize the schema
    Init,

    /// Print database statistics
    Stats,

    /// Reclaim unused space in the database file
    Vacuum,

    /// Generate shell completions for critica
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// critica - review catalog storage
///
/// Maintains the SQLite database behind a review-aggregation service:
/// titles, categories, genres, user accounts, reviews and comments.
#[derive(Parser, Debug)]
#[command(name = "critica")]
#[command(version = "0.1.0")]
#[command(about = "Review catalog storage administration")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Database file path (defaults to the platform data directory)
    #[arg(short, long)]
    database_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Minimal stderr logger with per-level colors
struct CliLogger {
    level: LevelFilter,
}

impl CliLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CliLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CommandLineOptions::parse();

    let config = Config::from_file_or_default(&cli.config_path)?;

    let log_level = cli
        .log_level
        .map(LogLevel::from)
        .unwrap_or(config.log_level);
    CliLogger::init(log_level.to_level_filter())?;

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "critica", &mut std::io::stdout());
        return Ok(());
    }

    let db = match cli.database_path.or(config.database_path) {
        Some(path) => DatabaseConnection::new(path)?,
        None => DatabaseConnection::new_default()?,
    };

    match cli.command {
        Commands::Init => {
            // Opening the connection already created the schema
            info!("Database initialized at {:?}", db.path());
        }
        Commands::Stats => {
            let stats = db.stats()?;
            println!("{}", stats);
        }
        Commands::Vacuum => {
            db.vacuum()?;
            info!("Database vacuumed");
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
