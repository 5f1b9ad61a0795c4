use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use rv_asm::{Assembler, AssemblerConfig, Program};

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble an RV32I-subset source file")]
struct Opts {
    /// Input assembly file (one instruction or label per line)
    #[arg(value_name = "SRCFILE")]
    input: PathBuf,
    /// Address of the first instruction (hex or dec)
    #[arg(long, value_parser = parse_u32, default_value = "0x00400000")]
    base: u32,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Binary words in nibble groups
    Text,
    /// Address, hex word and source per line
    Hex,
    Json,
    /// Raw little-endian words
    Bin,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn render(prog: &Program, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buf = String::new();
    match format {
        OutputFormat::Text => {
            for a in &prog.code {
                writeln!(buf, "{}", a.word)?;
            }
        }
        OutputFormat::Hex => {
            for a in &prog.code {
                writeln!(buf, "{:#010x}: {:08x}  {}", a.address, a.word, a.instruction)?;
            }
        }
        OutputFormat::Json => {
            buf = serde_json::to_string_pretty(prog)?;
            buf.push('\n');
        }
        OutputFormat::Bin => {
            return Ok(prog.code.iter().flat_map(|a| a.word.to_le_bytes()).collect());
        }
    }
    Ok(buf.into_bytes())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let text = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;

    let asm = Assembler::new(AssemblerConfig { base_address: opts.base });
    let prog = asm
        .assemble_program(text.lines())
        .with_context(|| format!("assembling {}", opts.input.display()))?;
    tracing::info!(words = prog.code.len(), labels = prog.labels.len(), "done");

    let out = render(&prog, opts.format)?;
    match opts.output {
        Some(path) => {
            std::fs::write(&path, out).with_context(|| format!("writing {}", path.display()))?
        }
        None => {
            use std::io::Write as _;
            std::io::stdout().write_all(&out)?;
        }
    }
    Ok(())
}
