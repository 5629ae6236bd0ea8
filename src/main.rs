// Geodata Import - Command line
// load-* commands fill the tables; show, runs and unlock inspect them

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use geodata_import::{
    count_rows, force_unlock, get_runs, list_rows, open_database, run_dataset, Dataset, ImportError,
    LoadOptions, RunStatus,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "geodata-import", version, about = "Load reference geodata into SQLite")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "GEODATA_DATABASE", default_value = "geodata.db", global = true)]
    database: PathBuf,

    /// Parent directory for temporary downloads
    #[arg(long, env = "GEODATA_WORKDIR", global = true)]
    workdir: Option<PathBuf>,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<log::LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load time zone boundaries (tz_world)
    LoadTz(ShapefileArgs),

    /// Load city centers (Natural Earth populated places)
    LoadCities(ShapefileArgs),

    /// Load GeoLite City locations
    LoadGeoip(ArchiveArgs),

    /// Load GeoLite City IPv4 blocks (run load-geoip first)
    LoadIps(ArchiveArgs),

    /// Load the FedWire routing directory
    LoadFedwire(FedwireArgs),

    /// List stored rows
    Show {
        dataset: Dataset,

        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List recent import runs
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Clear the lock left behind by a crashed run
    Unlock { dataset: Dataset },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Keep existing rows instead of wiping the table first
    #[arg(long)]
    no_wipe: bool,

    /// Rows per insert (0 = single batch)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Log progress every N records (0 = off)
    #[arg(long)]
    log_interval: Option<usize>,

    /// Source URL instead of the default
    #[arg(long)]
    url: Option<String>,
}

#[derive(Debug, Args)]
struct ArchiveArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Local ZIP archive instead of downloading
    #[arg(long, conflicts_with = "url")]
    archive: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ShapefileArgs {
    #[command(flatten)]
    source: ArchiveArgs,

    /// Skip features that cannot be mapped
    #[arg(long)]
    lax: bool,

    /// Do not log every saved feature
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Args)]
struct FedwireArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Local directory file instead of HTTP
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,
}

impl CommonArgs {
    fn options(self, workdir: Option<PathBuf>) -> LoadOptions {
        LoadOptions {
            url: self.url,
            workdir,
            no_wipe: self.no_wipe,
            batch_size: self.batch_size,
            log_interval: self.log_interval,
            ..LoadOptions::default()
        }
    }
}

impl ArchiveArgs {
    fn options(self, workdir: Option<PathBuf>) -> LoadOptions {
        LoadOptions {
            archive: self.archive,
            ..self.common.options(workdir)
        }
    }
}

impl ShapefileArgs {
    fn options(self, workdir: Option<PathBuf>) -> LoadOptions {
        LoadOptions {
            lax: self.lax,
            quiet: self.quiet,
            ..self.source.options(workdir)
        }
    }
}

impl FedwireArgs {
    fn options(self, workdir: Option<PathBuf>) -> LoadOptions {
        LoadOptions {
            file: self.file,
            ..self.common.options(workdir)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = cli.log_level {
        logger.filter_level(level);
    }
    logger.init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            let code = e
                .downcast_ref::<ImportError>()
                .map(ImportError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let conn = open_database(&cli.database)
        .with_context(|| format!("Cannot open database {}", cli.database.display()))?;
    let workdir = cli.workdir;

    match cli.command {
        Command::LoadTz(args) => load(&conn, Dataset::Tz, args.options(workdir)),
        Command::LoadCities(args) => load(&conn, Dataset::Cities, args.options(workdir)),
        Command::LoadGeoip(args) => load(&conn, Dataset::Geoip, args.options(workdir)),
        Command::LoadIps(args) => load(&conn, Dataset::Ips, args.options(workdir)),
        Command::LoadFedwire(args) => load(&conn, Dataset::Fedwire, args.options(workdir)),
        Command::Show { dataset, limit, json } => show(&conn, dataset, limit, json),
        Command::Runs { limit } => runs(&conn, limit),
        Command::Unlock { dataset } => unlock(&conn, dataset),
    }
}

fn load(conn: &Connection, dataset: Dataset, options: LoadOptions) -> Result<()> {
    println!("📥 {}: {}", dataset, options.source(dataset));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let summary = run_dataset(conn, dataset, &options).with_context(|| format!("{} failed", dataset))?;

    println!("\n🔍 Verifying {}...", dataset.table());
    let count = count_rows(conn, dataset)?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {} complete", dataset);
    println!("✓ Wiped:    {}", summary.wiped);
    println!("✓ Imported: {} ({} batches)", summary.imported, summary.batches);
    println!("✓ Table {} now holds {} rows", dataset.table(), count);

    Ok(())
}

fn show(conn: &Connection, dataset: Dataset, limit: usize, json: bool) -> Result<()> {
    let rows = list_rows(conn, dataset, Some(limit))?;

    if json {
        let values: Vec<&serde_json::Value> = rows.iter().map(|row| &row.json).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    let total = count_rows(conn, dataset)?;
    println!("📊 {} ({} of {} rows)", dataset.table(), rows.len(), total);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for row in &rows {
        println!("  {}", row.line);
    }

    Ok(())
}

fn runs(conn: &Connection, limit: usize) -> Result<()> {
    let runs = get_runs(conn, limit)?;
    if runs.is_empty() {
        println!("No import runs recorded yet");
        return Ok(());
    }

    println!("🕓 Last {} import runs", runs.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for run in &runs {
        let icon = match run.status {
            RunStatus::Succeeded => "✅",
            RunStatus::Failed => "❌",
            RunStatus::Running => "⏳",
        };
        println!(
            "{} {} {:<13} imported {:>9}  wiped {:>9}  {}",
            icon,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.dataset,
            run.imported,
            run.wiped,
            run.run_id.get(..8).unwrap_or(run.run_id.as_str())
        );
        if let Some(error) = &run.error {
            println!("   {}", error);
        }
    }

    Ok(())
}

fn unlock(conn: &Connection, dataset: Dataset) -> Result<()> {
    if force_unlock(conn, dataset.command())? {
        println!("🔓 Released lock on {}", dataset);
    } else {
        println!("✓ {} was not locked", dataset);
    }
    Ok(())
}
