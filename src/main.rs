use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use building_reconcile::{
    export, logging, pipeline, FilterStats, MatchTier, PipelineConfig, SummaryFilter,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconcile lease transactions against the building register", long_about = None)]
struct Cli {
    /// Debug-level logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate transaction extracts into per-building summaries
    Reconcile(ReconcileArgs),
    /// Select summaries from a processed CSV by room type and address
    Filter(FilterArgs),
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// TOML config file (missing file = defaults)
    #[arg(short, long, default_value = "reconcile.toml")]
    config: PathBuf,

    /// Building-register title extract; replaces the configured list
    #[arg(long = "registry")]
    registry: Vec<PathBuf>,

    /// Transaction extract; replaces the configured list
    #[arg(long = "transactions")]
    transactions: Vec<PathBuf>,

    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// SQLite database to upsert summaries into
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Processed summaries CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Room type label, e.g. "studio"
    #[arg(long)]
    room_type: Option<String>,

    /// Address to keep (repeatable; none = all)
    #[arg(long = "address")]
    addresses: Vec<String>,

    /// Write the selected summaries here
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Reconcile(args) => run_reconcile(args),
        Command::Filter(args) => run_filter(args),
    }
}

fn run_reconcile(args: ReconcileArgs) -> Result<()> {
    let mut config = PipelineConfig::load(&args.config)?;

    if !args.registry.is_empty() {
        config.input.registry_files = args.registry;
    }
    if !args.transactions.is_empty() {
        config.input.transaction_files = args.transactions;
    }
    if let Some(out) = args.out {
        config.output.dir = out;
    }
    if args.db.is_some() {
        config.output.database = args.db;
    }

    println!("🏢 Building Reconcile v{}", building_reconcile::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let report = pipeline::run(&config)?;
    let written = pipeline::persist(&config, &report)?;

    println!("\n📊 {}", report.summary());
    for tier in [
        MatchTier::ExactKey,
        MatchTier::AddressContainment,
        MatchTier::NameContainment,
        MatchTier::Unmatched,
    ] {
        println!("   {:<20} {}", tier.as_str(), report.batch.tier_count(tier));
    }

    println!();
    if let Some(path) = written.csv {
        println!("✓ CSV:  {}", path.display());
    }
    if let Some(path) = written.json {
        println!("✓ JSON: {}", path.display());
    }
    if let Some(rows) = written.database_rows {
        println!("✓ Database: {} rows upserted", rows);
    }

    Ok(())
}

fn run_filter(args: FilterArgs) -> Result<()> {
    let summaries = export::read_csv(&args.input)
        .with_context(|| format!("Failed to load summaries from {}", args.input.display()))?;

    let filter = SummaryFilter {
        room_type: args.room_type,
        addresses: args.addresses,
    };

    let selected = filter.apply(&summaries);
    let stats = FilterStats::collect(&selected);
    info!(total = summaries.len(), selected = stats.count, "filtered summaries");

    println!("🔎 {} of {} buildings selected", stats.count, summaries.len());
    if stats.count > 0 {
        println!("   mean area:          {:.1} m²", stats.mean_area);
        println!("   mean deposit:       {:.0}", stats.mean_deposit);
        println!("   mean monthly rent:  {:.1}", stats.mean_monthly_rent);
        println!("   mean build year:    {:.0}", stats.mean_construction_year);
        println!("\n   by region:");
        for (region, count) in &stats.by_region {
            println!("   {:<30} {}", region, count);
        }
    }

    if let Some(out) = args.out {
        let rows = export::write_csv(&out, selected.iter().copied())?;
        println!("\n✓ Wrote {} rows to {}", rows, out.display());
    }

    Ok(())
}
