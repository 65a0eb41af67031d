//! Command-line entry point (out of scope per the design -- thin glue
//! around the library's public API).
//!
//! Usage: `fsais [--ram-use BYTES] [--max-block-size N] [--alphabet-size N]
//! [--tmp-dir DIR] TEXT_PATH SA_PATH`

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use fsais_em::{Config, InMemoryRecursor};

struct Args {
    text_path: PathBuf,
    sa_path: PathBuf,
    ram_use: u64,
    max_block_size: u64,
    alphabet_size: u64,
    tmp_dir: PathBuf,
}

fn parse_args() -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut ram_use = 1u64 << 30;
    let mut max_block_size = 1u64 << 24;
    let mut alphabet_size = 256u64;
    let mut tmp_dir = env::temp_dir();

    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--ram-use" => ram_use = next_u64(&mut it, "--ram-use")?,
            "--max-block-size" => max_block_size = next_u64(&mut it, "--max-block-size")?,
            "--alphabet-size" => alphabet_size = next_u64(&mut it, "--alphabet-size")?,
            "--tmp-dir" => tmp_dir = PathBuf::from(it.next().ok_or("--tmp-dir needs a value")?),
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 2 {
        return Err(format!("expected TEXT_PATH and SA_PATH, got {} positional argument(s)", positional.len()));
    }
    Ok(Args {
        text_path: PathBuf::from(&positional[0]),
        sa_path: PathBuf::from(&positional[1]),
        ram_use,
        max_block_size,
        alphabet_size,
        tmp_dir,
    })
}

fn next_u64(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<u64, String> {
    it.next()
        .ok_or_else(|| format!("{flag} needs a value"))?
        .parse()
        .map_err(|_| format!("{flag} needs an integer value"))
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("fsais: {msg}");
            return ExitCode::FAILURE;
        }
    };

    let n = match std::fs::metadata(&args.text_path) {
        Ok(m) => m.len(),
        Err(e) => {
            eprintln!("fsais: cannot stat {}: {}", args.text_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let config = Config::new(args.ram_use, args.max_block_size, args.tmp_dir).with_alphabet_size(args.alphabet_size);

    match fsais_em::construct(&args.text_path, n, &args.sa_path, &config, &InMemoryRecursor) {
        Ok(stats) => {
            log::info!("{:?}", stats);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("fsais: {e}");
            ExitCode::FAILURE
        }
    }
}
