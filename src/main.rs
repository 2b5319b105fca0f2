//! Runs workers over a randomly initialized array and records every applied operation.
//!
//! ```bash
//! cargo run --release -- --array-len 100000 --workers 15 --iterations 10000 -o outputfile.txt
//! RUST_LOG=lockset=debug cargo run -- --array-len 8 --workers 4 --iterations 10 --stdout
//! ```

use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lockset::{run, Arc, Config, ElementStore, MemorySink, RunSummary, WriterSink};

#[derive(Parser, Debug)]
#[command(name = "lockset")]
#[command(about = "Concurrent read-modify-write workers over per-element reader-writer locks")]
struct Args {
    /// Number of elements in the shared array
    #[arg(short = 'n', long, default_value = "100000")]
    array_len: usize,

    /// Number of worker threads
    #[arg(short, long, default_value = "15")]
    workers: usize,

    /// Operations per worker
    #[arg(short, long, default_value = "10000")]
    iterations: usize,

    /// Seed for reproducible index selection
    #[arg(long)]
    seed: Option<u64>,

    /// Give up on a single acquisition after this many milliseconds
    #[arg(long)]
    acquire_timeout_ms: Option<u64>,

    /// File receiving one line per applied operation
    #[arg(short, long, default_value = "outputfile.txt")]
    output: PathBuf,

    /// Write records to stdout instead of the output file
    #[arg(long, conflicts_with = "quiet")]
    stdout: bool,

    /// Keep records in memory only
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Args = Args::parse();
    let mut config: Config = Config::new(args.array_len, args.workers, args.iterations)?;
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(timeout_ms) = args.acquire_timeout_ms {
        config = config.with_acquire_timeout(Duration::from_millis(timeout_ms));
    }

    let store: Arc<ElementStore> = Arc::new(ElementStore::with_random_values(config.array_len()));

    let summary: RunSummary = if args.quiet {
        run(&config, store, Arc::new(MemorySink::new()))?
    } else {
        let writer: Box<dyn Write + Send> = if args.stdout {
            Box::new(io::stdout())
        } else {
            Box::new(LineWriter::new(File::create(&args.output)?))
        };
        run(&config, store, Arc::new(WriterSink::new(writer)))?
    };

    println!("Program execution time: {} ms", summary.elapsed.as_millis());
    if summary.failed() > 0 {
        println!("{} operations failed, see the diagnostics in the output.", summary.failed());
    }
    if !args.quiet && !args.stdout {
        println!("The result is saved in {}.", args.output.display());
    }
    println!("All completed.");
    Ok(())
}
