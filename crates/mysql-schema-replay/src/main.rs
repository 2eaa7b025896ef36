//! mysql-schema-replay CLI
//!
//! Applies DDL statements to a recorded schema history, rebuilds schemas
//! from it and compares schema snapshots.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use mysql_schema_core::schema::CaptureRows;
use mysql_schema_core::{CaseSensitivity, CharsetCascade, EngineConfig, Schema};
use mysql_schema_replay::{
    BinlogPosition, BinlogStatement, DdlEvent, Recorder, ReplayError, SchemaHistory,
};

/// Offline schema tracking for MySQL binlog DDL.
#[derive(Parser)]
#[command(name = "mysql-schema-replay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name comparison mode, as set by lower_case_table_names.
    #[arg(long, env = "SCHEMA_CASE_SENSITIVITY", value_enum, default_value_t = CaseMode::Sensitive)]
    case_sensitivity: CaseMode,

    /// What ALTER DATABASE ... CHARACTER SET does to existing tables.
    #[arg(long, env = "SCHEMA_CHARSET_CASCADE", value_enum, default_value_t = Cascade::Never)]
    charset_cascade: Cascade,

    /// Server default charset for an empty base schema.
    #[arg(long, env = "SCHEMA_SERVER_CHARSET", default_value = "utf8mb4")]
    server_charset: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply statements and record the changes they make.
    Apply {
        /// Schema history file.
        #[arg(long, default_value = "schema-history.jsonl")]
        history: PathBuf,

        /// Schema the history starts from (empty if not specified).
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// JSON lines file of statements with position, database and sql.
        statements: PathBuf,

        /// Print a DDL event for each change.
        #[arg(long)]
        events: bool,

        /// Skip statements that fail without corrupting the schema.
        #[arg(long)]
        skip_errors: bool,
    },

    /// Rebuild a schema from history and print it as JSON.
    Replay {
        /// Schema history file.
        #[arg(long, default_value = "schema-history.jsonl")]
        history: PathBuf,

        /// Schema the history starts from (empty if not specified).
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Last position to replay, as file:offset.
        #[arg(short, long)]
        until: Option<BinlogPosition>,
    },

    /// Compare two schemas and list their differences.
    Diff {
        /// Schema JSON, e.g. the output of `replay`.
        left: PathBuf,

        /// Schema JSON, or capture rows with `--capture`.
        right: PathBuf,

        /// Read the right side as information_schema capture rows.
        #[arg(long)]
        capture: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CaseMode {
    Sensitive,
    Lower,
    Compare,
}

impl From<CaseMode> for CaseSensitivity {
    fn from(mode: CaseMode) -> Self {
        match mode {
            CaseMode::Sensitive => Self::CaseSensitive,
            CaseMode::Lower => Self::ConvertToLower,
            CaseMode::Compare => Self::ConvertOnCompare,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Cascade {
    Never,
    Inheriting,
}

impl From<Cascade> for CharsetCascade {
    fn from(cascade: Cascade) -> Self {
        match cascade {
            Cascade::Never => Self::Never,
            Cascade::Inheriting => Self::InheritingTables,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = EngineConfig {
        case_sensitivity: cli.case_sensitivity.into(),
        charset_cascade: cli.charset_cascade.into(),
        server_charset: cli.server_charset,
    };

    match cli.command {
        Commands::Apply {
            history,
            base,
            statements,
            events,
            skip_errors,
        } => {
            let base = load_base(base.as_deref(), &config)?;
            let history = SchemaHistory::open(history)?;
            let mut recorder = Recorder::resume(&base, config, history)?;

            let file = fs::File::open(&statements)
                .with_context(|| format!("opening {}", statements.display()))?;
            let mut stdout = io::stdout().lock();
            let mut recorded = 0usize;
            let mut skipped = 0usize;
            for (index, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let statement: BinlogStatement = serde_json::from_str(&line)
                    .with_context(|| format!("{}:{}", statements.display(), index + 1))?;
                match recorder.record_statement(&statement) {
                    Ok(Some(entry)) => {
                        recorded += 1;
                        if events {
                            for event in DdlEvent::from_entry(entry) {
                                writeln!(stdout, "{}", serde_json::to_string(&event)?)?;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(ReplayError::Statement(e)) if skip_errors && !e.is_fatal_to_stream() => {
                        warn!(position = %statement.position, "Skipping statement: {e}");
                        skipped += 1;
                    }
                    Err(e) => {
                        return Err(e)
                            .with_context(|| format!("at position {}", statement.position));
                    }
                }
            }
            info!(recorded, skipped, "Statements applied");
        }

        Commands::Replay {
            history,
            base,
            until,
        } => {
            let base = load_base(base.as_deref(), &config)?;
            let history = SchemaHistory::open(history)?;
            let schema = history.replay(&base, until.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }

        Commands::Diff {
            left,
            right,
            capture,
        } => {
            let left_schema = read_schema(&left)?;
            let right_schema = if capture {
                let rows: CaptureRows = read_json(&right)?;
                Schema::from_capture(&rows, config.case_sensitivity)?
            } else {
                read_schema(&right)?
            };
            let diff = left_schema.diff(
                &right_schema,
                &left.display().to_string(),
                &right.display().to_string(),
            );
            if diff.is_empty() {
                info!("Schemas match.");
            } else {
                print!("{diff}");
                bail!("{} difference(s) found", diff.len());
            }
        }
    }

    Ok(())
}

fn load_base(path: Option<&Path>, config: &EngineConfig) -> anyhow::Result<Schema> {
    match path {
        Some(path) => read_schema(path),
        None => Ok(Schema::new(
            config.server_charset.as_str(),
            config.case_sensitivity,
        )),
    }
}

fn read_schema(path: &Path) -> anyhow::Result<Schema> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
