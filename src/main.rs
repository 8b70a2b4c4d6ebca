use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use keysweep::oracle::{Aes128CbcOracle, CipherOracle, block_from_text, parse_block};
use keysweep::search::config::{ASCII_END, ASCII_START};
use keysweep::search::parallel::config::{DEFAULT_CHECK_INTERVAL, DEFAULT_CHUNK_SIZE};
use keysweep::search::{
    KeyLayout, KnownPlaintextAttack, ParallelConfig, PartitionStrategy, SearchOutcome, SelfTest,
};
use keysweep::{KeySweepError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Exit status when the whole space was searched without a match.
const EXIT_NOT_FOUND: i32 = 2;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "keysweep")]
#[command(about = "keysweep - parallel AES-128-CBC partial key search")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Log search progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI partition strategy selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPartition {
    /// One contiguous block of indices per worker
    Block,
    /// Fixed-size chunks dealt round-robin to workers
    Chunked,
}

impl From<CliPartition> for PartitionStrategy {
    fn from(cli: CliPartition) -> Self {
        match cli {
            CliPartition::Block => PartitionStrategy::Block,
            CliPartition::Chunked => PartitionStrategy::Chunked,
        }
    }
}

/// Options shared by every searching subcommand
#[derive(ClapArgs, Debug)]
struct SearchArgs {
    // --- Candidate range ---
    /// Lowest byte value tried in each unknown position
    #[arg(long, default_value_t = ASCII_START)]
    range_start: u8,
    /// Highest byte value tried in each unknown position
    #[arg(long, default_value_t = ASCII_END)]
    range_end: u8,

    // --- Parallel search options ---
    /// Number of worker threads
    #[arg(long, short = 'j', default_value_t = 4)]
    workers: usize,
    /// Use one worker per logical CPU (overrides --workers)
    #[arg(long)]
    all_cores: bool,
    /// How the key space is split between workers
    #[arg(long, value_enum, default_value = "block")]
    partition: CliPartition,
    /// Chunk size for chunked partitioning
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: u64,
    /// Candidates tested between checks of the stop flag
    #[arg(long, default_value_t = DEFAULT_CHECK_INTERVAL)]
    check_interval: u64,
    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Show a progress bar on stderr
    #[arg(long)]
    progress: bool,
    /// Print search statistics after the result
    #[arg(long)]
    stats: bool,
}

impl SearchArgs {
    fn parallel_config(&self) -> ParallelConfig {
        let config = ParallelConfig::default()
            .with_workers(self.workers)
            .with_partition(self.partition.into())
            .with_chunk_size(self.chunk_size)
            .with_check_interval(self.check_interval)
            .with_timeout_option(self.timeout.map(Duration::from_secs))
            .with_progress(self.progress);
        if self.all_cores {
            config.with_all_cores()
        } else {
            config
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a message under a known key, then recover the hidden part of it
    Demo {
        /// Full 16-byte key used to produce the ciphertext
        #[arg(long, default_value = "######9Hb3######")]
        key: String,
        /// Position of the first hidden key byte
        #[arg(long, default_value_t = 6)]
        offset: usize,
        /// Number of hidden key bytes
        #[arg(long, default_value_t = 4)]
        width: usize,
        /// Message to encrypt
        #[arg(long, default_value = "Please work...")]
        plaintext: String,
        /// 16-byte initialization vector, as text
        #[arg(long, default_value = "0123456789012345")]
        iv: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Recover a key from a ciphertext and the plaintext it encrypts
    Crack {
        /// Ciphertext as hex
        #[arg(long)]
        ciphertext: String,
        /// Known plaintext
        #[arg(long)]
        plaintext: String,
        /// Known leading key bytes, as text
        #[arg(long, default_value = "")]
        prefix: String,
        /// Known trailing key bytes, as text
        #[arg(long, default_value = "")]
        suffix: String,
        /// 16-byte initialization vector, as text
        #[arg(long, conflicts_with = "iv_hex")]
        iv: Option<String>,
        /// Initialization vector as 32 hex digits
        #[arg(long)]
        iv_hex: Option<String>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Encrypt a message and print the ciphertext as hex
    Encrypt {
        /// 16-byte key, as text
        #[arg(long)]
        key: String,
        /// 16-byte initialization vector, as text
        #[arg(long, default_value = "0123456789012345")]
        iv: String,
        /// Message to encrypt
        #[arg(long)]
        plaintext: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_demo(
    key: &str,
    offset: usize,
    width: usize,
    plaintext: &str,
    iv: &str,
    search: &SearchArgs,
) -> Result<SearchOutcome> {
    let true_key = block_from_text(key)?;
    let layout =
        KeyLayout::around(&true_key, offset, width)?.with_range(search.range_start, search.range_end);
    let test = SelfTest {
        layout,
        true_key,
        plaintext: plaintext.as_bytes().to_vec(),
        iv: block_from_text(iv)?,
    };
    test.run(Arc::new(Aes128CbcOracle), &search.parallel_config())
}

fn run_crack(
    ciphertext: &str,
    plaintext: &str,
    prefix: &str,
    suffix: &str,
    iv: &[u8; 16],
    search: &SearchArgs,
) -> Result<SearchOutcome> {
    let layout = KeyLayout::default()
        .with_prefix(prefix.as_bytes())
        .with_suffix(suffix.as_bytes())
        .fill_width()
        .with_range(search.range_start, search.range_end);
    let attack = KnownPlaintextAttack {
        layout,
        plaintext: plaintext.as_bytes().to_vec(),
        ciphertext: hex::decode(ciphertext.trim())?,
        iv: *iv,
    };
    attack.run(Arc::new(Aes128CbcOracle), &search.parallel_config())
}

fn run_encrypt(key: &str, iv: &str, plaintext: &str) -> Result<()> {
    let ciphertext =
        Aes128CbcOracle.encrypt(plaintext.as_bytes(), &block_from_text(key)?, &block_from_text(iv)?)?;
    println!("{}", hex::encode(ciphertext));
    Ok(())
}

/// Print the outcome and pick the process exit status.
fn report(outcome: &SearchOutcome, show_stats: bool) -> i32 {
    print!("\n{}", outcome);
    if show_stats {
        println!("\nSearch Statistics:");
        print!("{}", outcome.statistics.format_summary());
    }
    if outcome.found() { 0 } else { EXIT_NOT_FOUND }
}

fn exit_with_error(e: KeySweepError) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let code = match args.command {
        Commands::Demo {
            key,
            offset,
            width,
            plaintext,
            iv,
            search,
        } => match run_demo(&key, offset, width, &plaintext, &iv, &search) {
            Ok(outcome) => report(&outcome, search.stats),
            Err(e) => exit_with_error(e),
        },
        Commands::Crack {
            ciphertext,
            plaintext,
            prefix,
            suffix,
            iv,
            iv_hex,
            search,
        } => {
            let iv = match (iv, iv_hex) {
                (_, Some(hex_text)) => parse_block(&hex_text),
                (Some(text), None) => block_from_text(&text),
                (None, None) => block_from_text("0123456789012345"),
            };
            let outcome = iv.and_then(|iv| {
                run_crack(&ciphertext, &plaintext, &prefix, &suffix, &iv, &search)
            });
            match outcome {
                Ok(outcome) => report(&outcome, search.stats),
                Err(e) => exit_with_error(e),
            }
        }
        Commands::Encrypt { key, iv, plaintext } => match run_encrypt(&key, &iv, &plaintext) {
            Ok(()) => 0,
            Err(e) => exit_with_error(e),
        },
    };

    std::process::exit(code);
}
