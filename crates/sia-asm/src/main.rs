use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sia_asm::{assemble, listing};

#[derive(Parser, Debug)]
#[command(author, version, about = "SIA assembler: one instruction per line to a raw binary image")]
struct Opts {
    /// Assembly source (one instruction per line)
    #[arg(value_name = "SOURCE")]
    input: PathBuf,
    /// Binary image to write (header-less, big-endian instructions)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Print address, bytes and disassembly of every emitted instruction
    #[arg(long)]
    listing: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let text = fs::read_to_string(&opts.input)
        .with_context(|| format!("failed to read source {}", opts.input.display()))?;
    let asm = assemble(&text)
        .with_context(|| format!("failed to assemble {}", opts.input.display()))?;

    for d in &asm.diagnostics {
        eprintln!("Error: {}:{}: {}", opts.input.display(), d.line, d.message);
    }

    fs::write(&opts.output, &asm.bytes)
        .with_context(|| format!("failed to write output {}", opts.output.display()))?;

    if opts.listing {
        for line in listing(&asm.bytes) {
            println!("{line}");
        }
    }
    Ok(())
}
