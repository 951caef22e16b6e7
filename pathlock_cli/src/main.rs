use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use pathlock_core::{
    keypair, Puzzle, HEADER_BYTES, NONCE_BYTES, PUBLIC_KEY_BYTES, SECRET_KEY_BYTES, SOLUTION_BYTES,
};

#[derive(Parser)]
#[command(name = "pathlock", author, version, about = "pathlock proof-of-work tools")]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Kyber-768 keypair and write it to disk.
    Keygen {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Mine a solution for a header and nonce.
    Mine {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        /// 108-byte header as hex; randomly generated when omitted.
        #[arg(long, value_name = "HEX")]
        header: Option<String>,
        /// 32-byte nonce as hex; randomly generated when omitted.
        #[arg(long, value_name = "HEX")]
        nonce: Option<String>,
        /// Write the solution hex to a file instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Run the path search on all hardware cores.
        #[arg(long)]
        parallel: bool,
        /// Save the serialised adjacency matrix for inspection.
        #[arg(long, value_name = "FILE")]
        dump_matrix: Option<PathBuf>,
        /// Save the path nodes (little-endian u16s) for inspection.
        #[arg(long, value_name = "FILE")]
        dump_path: Option<PathBuf>,
    },
    /// Validate a solution against a header and nonce.
    Validate {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "HEX")]
        header: String,
        #[arg(long, value_name = "HEX")]
        nonce: String,
        /// File holding the solution as hex.
        #[arg(long, value_name = "FILE")]
        solution: PathBuf,
    },
    /// Repeatedly mine and validate, reporting solutions per second.
    Bench {
        /// Key bundle to use; a throwaway pair is generated when omitted.
        #[arg(long, value_name = "FILE")]
        keys: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        rounds: usize,
        #[arg(long, default_value_t = 20)]
        iterations: usize,
        #[arg(long)]
        parallel: bool,
    },
}

/// Keypair persisted as hex so the bundle stays greppable and diffable.
#[derive(Serialize, Deserialize)]
struct KeyBundle {
    public_key: String,
    secret_key: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match cli.command {
        Commands::Keygen { out } => cmd_keygen(&out),
        Commands::Mine {
            keys,
            header,
            nonce,
            out,
            parallel,
            dump_matrix,
            dump_path,
        } => cmd_mine(&keys, header, nonce, out, parallel, dump_matrix, dump_path),
        Commands::Validate {
            keys,
            header,
            nonce,
            solution,
        } => cmd_validate(&keys, &header, &nonce, &solution),
        Commands::Bench {
            keys,
            rounds,
            iterations,
            parallel,
        } => cmd_bench(keys, rounds, iterations, parallel),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

fn cmd_keygen(out: &Path) -> Result<()> {
    let (public_key, secret_key) = keypair();
    let bundle = KeyBundle {
        public_key: hex::encode(public_key),
        secret_key: hex::encode(secret_key),
    };
    let serialized = serde_json::to_string_pretty(&bundle)?;
    fs::write(out, serialized)
        .with_context(|| format!("writing key bundle to {}", out.display()))?;
    println!("Wrote Kyber-768 key bundle to {}", out.display());
    println!("Never share the secret key with anyone.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_mine(
    keys_path: &Path,
    header: Option<String>,
    nonce: Option<String>,
    out: Option<PathBuf>,
    parallel: bool,
    dump_matrix: Option<PathBuf>,
    dump_path: Option<PathBuf>,
) -> Result<()> {
    let (public_key, secret_key) = load_keys(keys_path)?;
    let header = resolve_preimage_part(header, HEADER_BYTES, "header")?;
    let nonce = resolve_preimage_part(nonce, NONCE_BYTES, "nonce")?;

    let mut puzzle = Puzzle::new();
    puzzle.initialize(&public_key, &secret_key);
    if parallel {
        puzzle.enable_parallel_dfs();
    }
    puzzle.set_header(&header);
    puzzle.set_nonce(&nonce);

    let start = Instant::now();
    if !puzzle.mine() {
        bail!("mining failed; run with --debug for the failing stage");
    }
    debug!(
        "mined {} bytes in {:.3}s (path length {})",
        puzzle.solution.len(),
        start.elapsed().as_secs_f64(),
        puzzle.path().len()
    );

    println!("header: {}", hex::encode(&header));
    println!("nonce:  {}", hex::encode(&nonce));
    match out {
        Some(path) => {
            fs::write(&path, puzzle.solution.to_hex())
                .with_context(|| format!("writing solution to {}", path.display()))?;
            println!("Wrote solution ({} bytes) to {}", SOLUTION_BYTES, path.display());
        }
        None => println!("solution: {}", puzzle.solution.to_hex()),
    }

    if let Some(path) = dump_matrix {
        puzzle
            .graph()
            .save_matrix(&path)
            .with_context(|| format!("writing adjacency matrix to {}", path.display()))?;
    }
    if let Some(path) = dump_path {
        puzzle
            .path()
            .save_nodes(&path)
            .with_context(|| format!("writing path nodes to {}", path.display()))?;
    }
    Ok(())
}

fn cmd_validate(keys_path: &Path, header: &str, nonce: &str, solution_path: &Path) -> Result<()> {
    let (public_key, secret_key) = load_keys(keys_path)?;
    let header = decode_sized_hex(header, HEADER_BYTES, "header")?;
    let nonce = decode_sized_hex(nonce, NONCE_BYTES, "nonce")?;
    let text = fs::read_to_string(solution_path)
        .with_context(|| format!("reading solution from {}", solution_path.display()))?;
    let solution = hex::decode(text.trim()).context("solution file is not valid hex")?;

    let mut puzzle = Puzzle::new();
    puzzle.initialize(&public_key, &secret_key);
    puzzle.set_header(&header);
    puzzle.set_nonce(&nonce);

    if !puzzle.validate(&solution) {
        bail!("solution is NOT valid for this header, nonce, and keypair");
    }
    println!("Solution is valid.");
    Ok(())
}

/// Throughput of one benchmark round.
struct RoundResult {
    generated_per_sec: f64,
    validated_per_sec: f64,
}

fn cmd_bench(keys: Option<PathBuf>, rounds: usize, iterations: usize, parallel: bool) -> Result<()> {
    if rounds == 0 || iterations == 0 {
        bail!("rounds and iterations must both be at least 1");
    }
    let (public_key, secret_key) = match keys {
        Some(path) => load_keys(&path)?,
        None => {
            println!("No key bundle given; benchmarking with a throwaway keypair.");
            keypair()
        }
    };

    let mut puzzle = Puzzle::new();
    puzzle.initialize(&public_key, &secret_key);
    if parallel {
        puzzle.enable_parallel_dfs();
    }

    let mut results = Vec::with_capacity(rounds);
    for round in 0..rounds {
        println!("Round: {}", round + 1);
        let result = bench_round(&mut puzzle, iterations)?;
        println!(
            "Generated Solutions: {}",
            format_rate(result.generated_per_sec)
        );
        println!(
            "Validated Solutions: {}",
            format_rate(result.validated_per_sec)
        );
        println!("------------------------------------------------");
        results.push(result);
    }

    print_summary(&results);
    Ok(())
}

fn bench_round(puzzle: &mut Puzzle, iterations: usize) -> Result<RoundResult> {
    let mut mined = Vec::with_capacity(iterations);

    let start = Instant::now();
    for _ in 0..iterations {
        let header = build_header();
        let nonce = random_bytes(NONCE_BYTES);
        puzzle.set_header(&header);
        puzzle.set_nonce(&nonce);
        if !puzzle.mine() {
            bail!("mining failed mid-benchmark");
        }
        mined.push((header, nonce, puzzle.solution.as_bytes().to_vec()));
    }
    let generated_per_sec = iterations as f64 / start.elapsed().as_secs_f64();

    let start = Instant::now();
    for (header, nonce, solution) in &mined {
        puzzle.set_header(header);
        puzzle.set_nonce(nonce);
        if !puzzle.validate(solution) {
            bail!("a freshly mined solution failed validation");
        }
    }
    let validated_per_sec = iterations as f64 / start.elapsed().as_secs_f64();

    Ok(RoundResult {
        generated_per_sec,
        validated_per_sec,
    })
}

fn print_summary(results: &[RoundResult]) {
    let avg = |f: fn(&RoundResult) -> f64| {
        results.iter().map(f).sum::<f64>() / results.len() as f64
    };
    let min = |f: fn(&RoundResult) -> f64| results.iter().map(f).fold(f64::INFINITY, f64::min);
    let max = |f: fn(&RoundResult) -> f64| results.iter().map(f).fold(0.0f64, f64::max);
    let gen = |r: &RoundResult| r.generated_per_sec;
    let val = |r: &RoundResult| r.validated_per_sec;

    println!();
    println!("=============================================================");
    println!("Average Generated Solutions Per Second : {}", format_rate(avg(gen)));
    println!("Average Validated Solutions Per Second : {}", format_rate(avg(val)));
    println!("-------------------------------------------------------------");
    println!("Min Generated Solutions Per Second     : {}", format_rate(min(gen)));
    println!("Max Generated Solutions Per Second     : {}", format_rate(max(gen)));
    println!("-------------------------------------------------------------");
    println!("Min Validated Solutions Per Second     : {}", format_rate(min(val)));
    println!("Max Validated Solutions Per Second     : {}", format_rate(max(val)));
    println!("=============================================================");
}

fn format_rate(rate: f64) -> String {
    if rate >= 1e9 {
        format!("{:.2} GSol/s", rate / 1e9)
    } else if rate >= 1e6 {
        format!("{:.2} MSol/s", rate / 1e6)
    } else if rate >= 1e3 {
        format!("{:.2} KSol/s", rate / 1e3)
    } else {
        format!("{rate:.2} sol/s")
    }
}

/// Assembles the reference 108-byte header: version, previous block hash,
/// merkle root, reserved zeros, time, bits.
fn build_header() -> Vec<u8> {
    let version: i32 = 2;
    let prev_block = random_bytes(32);
    let merkle_root = random_bytes(32);
    let reserved = [0u8; 32];
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    let bits: u32 = 0x1e1a_7099;

    let mut header = Vec::with_capacity(HEADER_BYTES);
    header.extend_from_slice(&version.to_le_bytes());
    header.extend_from_slice(&prev_block);
    header.extend_from_slice(&merkle_root);
    header.extend_from_slice(&reserved);
    header.extend_from_slice(&time.to_le_bytes());
    header.extend_from_slice(&bits.to_le_bytes());
    debug_assert_eq!(header.len(), HEADER_BYTES);
    header
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

fn resolve_preimage_part(value: Option<String>, len: usize, label: &str) -> Result<Vec<u8>> {
    match value {
        Some(text) => decode_sized_hex(&text, len, label),
        None => Ok(random_bytes(len)),
    }
}

fn decode_sized_hex(text: &str, len: usize, label: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(text.trim())
        .with_context(|| format!("{label} is not valid hex"))?;
    if bytes.len() != len {
        bail!("{label} must be {len} bytes, got {}", bytes.len());
    }
    Ok(bytes)
}

fn load_keys(path: &Path) -> Result<([u8; PUBLIC_KEY_BYTES], [u8; SECRET_KEY_BYTES])> {
    let data =
        fs::read(path).with_context(|| format!("reading keys from {}", path.display()))?;
    let bundle: KeyBundle =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;

    let public = hex::decode(&bundle.public_key).context("public_key is not valid hex")?;
    let secret = hex::decode(&bundle.secret_key).context("secret_key is not valid hex")?;
    let public: [u8; PUBLIC_KEY_BYTES] = public
        .try_into()
        .map_err(|v: Vec<u8>| anyhow::anyhow!("public key must be {PUBLIC_KEY_BYTES} bytes, got {}", v.len()))?;
    let secret: [u8; SECRET_KEY_BYTES] = secret
        .try_into()
        .map_err(|v: Vec<u8>| anyhow::anyhow!("secret key must be {SECRET_KEY_BYTES} bytes, got {}", v.len()))?;
    Ok((public, secret))
}
