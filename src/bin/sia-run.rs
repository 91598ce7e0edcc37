use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sia_rs::{Machine, MachineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run an SIA binary image on the sia-rs interpreter")]
struct Opts {
    /// Machine configuration as JSON (missing fields take defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Memory capacity in bytes (overrides the config file)
    #[arg(long)]
    mem_size: Option<usize>,
    /// Write the final CPU state as JSON
    #[arg(long, value_name = "FILE")]
    state_out: Option<PathBuf>,
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = match Opts::try_parse() {
        Ok(o) => o,
        Err(e) if e.use_stderr() => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    let mut cfg = match &opts.config {
        Some(path) => MachineConfig::from_json_file(path)?,
        None => MachineConfig::default(),
    };
    if let Some(size) = opts.mem_size {
        cfg.mem_size = size;
    }

    let mut machine = Machine::load_file(cfg, &opts.input)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = machine.run(&mut out);

    if let Some(path) = &opts.state_out {
        let json = serde_json::to_string_pretty(&machine.cpu)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    // The trap carries the faulting pc; machine.cpu.pc has already moved on
    result.with_context(|| format!("{} stopped", opts.input.display()))?;
    Ok(())
}
