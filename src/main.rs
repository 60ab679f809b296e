use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

mod params;
mod record;
mod sampler;

use params::{Invocation, parse_invocation, usage};
use sampler::{PayloadSampler, write_records};

#[derive(Parser, Debug)]
#[command(name = "csma-payload-gen")]
#[command(about = "Generate frame-send payload files for the CSMA/CD simulator")]
#[command(version)]
#[command(allow_negative_numbers = true)]
struct Args {
    /// <stations count> <samples count> <data size>
    #[arg(value_name = "PARAMS")]
    params: Vec<String>,

    /// Seed for reproducible output (default: OS entropy)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

/// Parses the full argv, program name included. `None` means "print the
/// usage line": fewer than three arguments always end there, even when
/// clap would reject them as unknown or incomplete flags.
fn parse_args<T: Into<OsString> + Clone>(argv: &[T]) -> Result<Option<Args>, clap::Error> {
    match Args::try_parse_from(argv.iter().cloned()) {
        Ok(args) => Ok(Some(args)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => Err(e),
        Err(_) if argv.len() < 4 => Ok(None),
        Err(e) => Err(e),
    }
}

fn print_usage<W: Write>(mut stdout: W, program: &str) -> Result<()> {
    writeln!(stdout, "{}", usage(program))?;
    Ok(())
}

fn run<W: Write>(args: &Args, program: &str, stdout: W) -> Result<()> {
    let params = match parse_invocation(&args.params).with_context(|| usage(program))? {
        Invocation::Usage => return print_usage(stdout, program),
        Invocation::Generate(params) => params,
    };

    info!(
        "Generating {} records for {} stations, payload size {}",
        params.sample_count, params.station_count, params.payload_size
    );

    let rng = match args.seed {
        Some(seed) => {
            info!("Seed: {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let sampler = PayloadSampler::new(params, rng);

    let written = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            let written = write_records(sampler, &mut BufWriter::new(file))
                .with_context(|| format!("Failed to write records to {}", path))?;
            info!("Payload file written to: {}", path);
            written
        }
        None => write_records(sampler, &mut BufWriter::new(stdout))
            .context("Failed to write records to stdout")?,
    };

    info!("Generated {} total records", written);
    Ok(())
}

fn main() -> Result<()> {
    // Records go to stdout, so logs must stay on stderr
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(io::stderr)
        .init();

    let argv: Vec<OsString> = std::env::args_os().collect();
    let program = argv
        .first()
        .map(|arg0| arg0.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csma-payload-gen".to_string());

    match parse_args(&argv) {
        Ok(Some(args)) => run(&args, &program, io::stdout().lock()),
        Ok(None) => print_usage(io::stdout().lock(), &program),
        Err(e) => e.exit(),
    }
}
