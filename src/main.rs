use anvil::config::DEFAULT_QUEUE_CAPACITY;
use anvil::dispatch::DispatcherConfig;
use anvil::extract::{run_extraction, ExtractConfig};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "anvil")]
#[command(about = "Extract verb conjugations from Wiktionary dumps")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract infinitives and verb forms into CSV files
    Extract(ExtractArgs),
    /// Print the wikitext of the first page with the given title
    View(ViewArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to the Wiktionary dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output directory for generated files
    #[arg(short, long)]
    output: String,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Pages that may wait for a worker before reading pauses
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Limit number of pages to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Dry run - don't write output files
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ViewArgs {
    /// Path to the Wiktionary dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Exact page title
    title: String,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let mut dispatcher = DispatcherConfig::default();
    if let Some(workers) = args.workers {
        dispatcher.workers = workers;
    }
    dispatcher.queue_capacity = args.queue_capacity;
    dispatcher.page_limit = args.limit;

    let config = ExtractConfig {
        input: args.input,
        output_dir: args.output,
        dispatcher,
        dry_run: args.dry_run,
    };

    info!("Starting extraction pass");
    let summary = run_extraction(&config)?;
    let stats = &summary.stats;

    println!();
    println!("=== Summary ===");
    println!("Extraction time:    {:.2}s", summary.duration_secs);
    println!();
    println!("Pages processed:    {}", stats.pages_processed);
    println!("Pages skipped:      {}", summary.skipped_pages);
    println!("Verb sections:      {}", stats.verb_sections);
    println!("Unknown languages:  {}", stats.unknown_languages);
    println!("Templates:          {}", stats.templates_extracted);
    println!("Templates skipped:  {}", stats.templates_skipped);
    println!("Template failures:  {}", stats.template_failures);
    println!("Storage errors:     {}", stats.sink_errors);
    println!();
    println!("Languages:          {}", summary.languages);
    println!("Words:              {}", summary.words);
    println!("Infinitives:        {}", summary.infinitives);
    println!("Verb forms:         {}", summary.verb_forms);

    Ok(())
}

fn run_view(args: ViewArgs) -> Result<()> {
    match anvil::view::find_page(&args.input, &args.title)? {
        Some(page) => {
            println!("{}", page.text);
            Ok(())
        }
        None => bail!("No page titled '{}' in {}", args.title, args.input),
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
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::View(args) => run_view(args),
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
