use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zsun_riders::config::SyncConfig;
use zsun_riders::io::{FileTransport, WorkbookDestination};
use zsun_riders::repository::RiderRepository;
use zsun_riders::{Result, RiderError, sync};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| RiderError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync(args) => execute_sync(args),
        Command::Dump(args) => execute_dump(args),
        Command::Export(args) => execute_export(args),
    }
}

fn execute_sync(args: SyncArgs) -> Result<()> {
    let config = args.settings.resolve()?;
    let retain = match &args.source.retain {
        Some(path) => Some(load_json(path)?),
        None => None,
    };
    let transport = FileTransport::new(&args.source.input);
    let mut destination = WorkbookDestination::open(&args.workbook, &config.sheet_name)?;

    let report = sync::run_sync(&transport, &mut destination, &config, retain.as_ref())?;
    info!(
        loaded = report.loaded,
        skipped = report.skipped,
        compacted = report.compacted,
        rows_matched = report.rows_matched,
        blocks_written = report.blocks_written,
        "sync complete"
    );
    Ok(())
}

fn execute_dump(args: DumpArgs) -> Result<()> {
    let config = args.settings.resolve()?;
    let repository = args.source.load_repository()?;
    let mut destination = WorkbookDestination::open(&args.workbook, &config.dump_sheet_name)?;
    sync::dump_to_destination(&repository, &mut destination)?;
    Ok(())
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let repository = args.source.load_repository()?;
    sync::export_json(&repository, &args.output)
}

fn load_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(RiderError::MissingInput(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Normalize rider data and keep a squad workbook up to date."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Update matching rows of the squad sheet in place.
    Sync(SyncArgs),
    /// Append every rider, sorted by name, to the dump sheet.
    Dump(DumpArgs),
    /// Write the normalized riders as JSON.
    Export(ExportArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Rider payload: a JSON object keyed by identifier or a JSON array.
    #[arg(long, env = "ZSUN_RIDERS_INPUT")]
    input: PathBuf,

    /// JSON array of identifiers to keep; every other rider is dropped.
    #[arg(long)]
    retain: Option<PathBuf>,
}

impl SourceArgs {
    fn load_repository(&self) -> Result<RiderRepository> {
        let mut repository = RiderRepository::new();
        sync::refresh_repository(&mut repository, &FileTransport::new(&self.input))?;
        if let Some(path) = &self.retain {
            repository.compact_to_subset_value(&load_json(path)?);
        }
        Ok(repository)
    }
}

#[derive(clap::Args)]
struct SettingsArgs {
    /// TOML file with sync settings.
    #[arg(long, env = "ZSUN_RIDERS_CONFIG")]
    config: Option<PathBuf>,

    /// Sheet updated by `sync`.
    #[arg(long, env = "ZSUN_RIDERS_SHEET")]
    sheet: Option<String>,

    /// Sheet written by `dump`.
    #[arg(long, env = "ZSUN_RIDERS_DUMP_SHEET")]
    dump_sheet: Option<String>,

    /// 1-based row holding the column headers.
    #[arg(long)]
    header_row: Option<u32>,

    /// Last sheet row scanned for matches.
    #[arg(long)]
    row_limit: Option<u32>,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::from_toml_path(path)?,
            None => SyncConfig::default(),
        };
        if let Some(sheet) = &self.sheet {
            config.sheet_name = sheet.clone();
        }
        if let Some(sheet) = &self.dump_sheet {
            config.dump_sheet_name = sheet.clone();
        }
        if let Some(row) = self.header_row {
            config.header_row = row;
        }
        if let Some(limit) = self.row_limit {
            config.row_limit = limit;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(clap::Args)]
struct SyncArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Workbook (.xlsx) to update.
    #[arg(long)]
    workbook: PathBuf,
}

#[derive(clap::Args)]
struct DumpArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Workbook (.xlsx) to write into; created when missing.
    #[arg(long)]
    workbook: PathBuf,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output JSON path.
    #[arg(long)]
    output: PathBuf,
}
