use alexandria::config::DEFAULT_LINE_LIMIT;
use alexandria::loader::Loader;
use alexandria::stats::PassStats;
use alexandria::store::JsonStore;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "alexandria")]
#[command(about = "Load Open Library data dumps into a local document store")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the author dump, then the works dump, in order
    Load(LoadArgs),
    /// Load only the author dump
    Authors(PassArgs),
    /// Load only the works dump (author names resolve to "Unknown Author"
    /// unless an author pass ran against the same store earlier)
    Works(PassArgs),
}

#[derive(Args)]
struct LoadArgs {
    /// Path to the author dump file
    #[arg(long)]
    authors: PathBuf,

    /// Path to the works dump file
    #[arg(long)]
    works: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct PassArgs {
    /// Path to the dump file
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// Directory holding the record store
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Maximum number of dump lines considered per pass
    #[arg(long, default_value_t = DEFAULT_LINE_LIMIT)]
    limit: usize,
}

fn run_load(args: LoadArgs) -> Result<()> {
    let mut store = JsonStore::open(&args.common.data_dir)?;
    let mut loader = Loader::new(&mut store, args.common.limit);

    let start = Instant::now();
    let report = loader.run(&args.authors, &args.works);

    print_summary("Author", report.authors.as_ref());
    print_summary("Work", report.works.as_ref());
    println!();
    println!("Total time:     {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn run_authors(args: PassArgs) -> Result<()> {
    let mut store = JsonStore::open(&args.common.data_dir)?;
    let mut loader = Loader::new(&mut store, args.common.limit);
    let stats = loader.load_authors(&args.input)?;
    print_summary("Author", Some(&stats));
    Ok(())
}

fn run_works(args: PassArgs) -> Result<()> {
    let mut store = JsonStore::open(&args.common.data_dir)?;
    let mut loader = Loader::new(&mut store, args.common.limit);
    let stats = loader.load_works(&args.input)?;
    print_summary("Work", Some(&stats));
    Ok(())
}

fn print_summary(pass: &str, stats: Option<&PassStats>) {
    println!();
    println!("=== {pass} pass ===");
    match stats {
        Some(stats) => {
            println!("Lines seen:     {}", stats.lines_seen);
            println!("Parsed:         {}", stats.parsed);
            println!("Skipped:        {}", stats.skipped);
            println!("Persisted:      {}", stats.persisted);
            println!("Store failures: {}", stats.store_failures);
        }
        None => println!("Aborted (see log for details)"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Load(args) => run_load(args),
        Commands::Authors(args) => run_authors(args),
        Commands::Works(args) => run_works(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
