use clap::{Parser, Subcommand};
use msfio::perf::hash_stream;
use msfio::{Msf, MsfStream, Superblock};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "msfcheck", about = "Inspect Multi-Stream Format (MSF / PDB) containers")]
struct Cli {
    /// Byte offset of the container inside the file
    #[arg(long, global = true, default_value = "0")]
    offset: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every stream with its length and a content digest
    Streams {
        input: PathBuf,
    },
    /// Show superblock fields
    Info {
        input: PathBuf,
        /// Emit a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write one stream's bytes to a file
    Extract {
        input: PathBuf,
        #[arg(short, long)]
        stream: usize,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Hex-dump part of a stream
    Dump {
        input: PathBuf,
        #[arg(short, long)]
        stream: usize,
        /// Logical offset to start at
        #[arg(long, default_value = "0")]
        skip: u64,
        /// Number of bytes to show
        #[arg(short = 'n', long, default_value = "256")]
        count: usize,
    },
}

#[derive(Serialize)]
struct InfoReport<'a> {
    path:           String,
    base_offset:    u64,
    superblock:     &'a Superblock,
    stream_lengths: Vec<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {

        // ── Streams ──────────────────────────────────────────────────────────
        Commands::Streams { input } => {
            let msf = open_msf(&input, cli.offset)?;
            println!("Found {} streams:", msf.streams.len());
            for (n, stream) in msf.streams.iter().enumerate() {
                if stream.is_nil() {
                    println!(" * stream {n}: (deleted)");
                    continue;
                }
                let digest = hash_stream(stream)?;
                println!(" * stream {:<4} {:>10} bytes {:>6} blocks  {}",
                    format!("{n}:"), stream.len(), stream.blocks().len(),
                    hex::encode(&digest.as_bytes()[..6]));
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let msf = open_msf(&input, cli.offset)?;
            let sb = &msf.superblock;
            if json {
                let report = InfoReport {
                    path:           input.display().to_string(),
                    base_offset:    msf.base_offset,
                    superblock:     sb,
                    stream_lengths: msf.streams.iter().map(MsfStream::len).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("── MSF Container ────────────────────────────────────────");
                println!("  Path              {}", input.display());
                println!("  Base offset       {}", msf.base_offset);
                println!("  Block size        {} B", sb.block_size);
                println!("  Block count       {}", sb.block_count);
                println!("  Free block map    {}", sb.free_block_map_block);
                println!("  Directory size    {} B ({} blocks)", sb.directory_byte_count, sb.directory_block_count());
                println!("  Block map address {}", sb.block_map_address);
                println!("  Streams           {}", msf.streams.len());
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { input, stream, output } => {
            let msf = open_msf(&input, cli.offset)?;
            let mut s = pick(&msf.streams, stream)?.clone();
            s.seek(SeekFrom::Start(0))?;
            let mut out = File::create(&output)?;
            let copied = io::copy(&mut s, &mut out)?;
            println!("Extracted stream {} ({} bytes) → {}", stream, copied, output.display());
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input, stream, skip, count } => {
            let msf = open_msf(&input, cli.offset)?;
            let s = pick(&msf.streams, stream)?;
            let mut buf = vec![0u8; count];
            let n = s.read_at(skip, &mut buf)?;
            for (row, line) in buf[..n].chunks(16).enumerate() {
                let ascii: String = line.iter()
                    .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                    .collect();
                println!("{:08x}  {:<32}  {}", skip + row as u64 * 16, hex::encode(line), ascii);
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn open_msf(path: &Path, offset: u64) -> Result<Msf<File>, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    Msf::open_at(Arc::new(file), offset).map_err(|e| -> Box<dyn std::error::Error> {
        if e.is_format_error() {
            format!("{}: invalid MSF file: {e}", path.display()).into()
        } else {
            e.into()
        }
    })
}

fn pick(streams: &[MsfStream<File>], index: usize) -> Result<&MsfStream<File>, Box<dyn std::error::Error>> {
    streams.get(index).ok_or_else(|| {
        format!("stream {} out of range (container has {} streams)", index, streams.len()).into()
    })
}
