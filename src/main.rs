// Main entry point for the application

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rand::distributions::Alphanumeric;
use rand::Rng;

use revex::client::{self, SessionOutcome};
use revex::common::config::{
    ClientConfig, ServerConfig, DEFAULT_MAX_CHUNK_BYTES, DEFAULT_OUTPUT_DIR, DEFAULT_PORT,
};
use revex::server::Server;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const OUTPUT_SUFFIX_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "revex")]
#[command(about = "Chunked bit-string reversal exchange over TCP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a document of binary digits and collect its reversed chunks
    Send {
        /// File holding the '0'/'1' document to send
        file: PathBuf,

        /// Responder IP address
        #[arg(long, default_value = "127.0.0.1")]
        server: String,

        /// Responder port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Smallest chunk to draw, in bytes
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        min_bytes: u64,

        /// Largest chunk to draw, in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_BYTES, value_parser = clap::value_parser!(u64).range(1..))]
        max_bytes: u64,

        /// Directory the reversed document is written into
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },

    /// Serve reversal sessions
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Refuse sessions that announce more chunks than this
        #[arg(long)]
        max_chunks: Option<u64>,
    },
}

/// Fresh output path with a random name so repeated sends never clobber
/// each other.
fn random_output_path(dir: &Path) -> PathBuf {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OUTPUT_SUFFIX_LEN)
        .map(char::from)
        .collect();
    dir.join(format!("{}_client.txt", suffix))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            file,
            server,
            port,
            min_bytes,
            max_bytes,
            output_dir,
        } => {
            println!("=== revex send ===\n");

            if !file.exists() {
                eprintln!("Error: File not found: {:?}", file);
                return Ok(());
            }

            let raw = fs::read_to_string(&file)?;
            let document = raw.trim_end();
            if let Some(bad) = document.bytes().find(|b| *b != b'0' && *b != b'1') {
                eprintln!(
                    "Error: document contains {:?}; only '0' and '1' are allowed",
                    bad as char
                );
                return Ok(());
            }

            let server_addr: SocketAddr = format!("{}:{}", server, port).parse()?;
            let config = ClientConfig::new(server_addr)
                .with_chunk_range(min_bytes, max_bytes)?
                .with_output_dir(output_dir);

            fs::create_dir_all(&config.output_dir)?;
            let output_path = random_output_path(&config.output_dir);
            let mut sink = fs::File::create(&output_path)?;

            println!("Document: {:?} ({} bit characters)", file, document.len());
            println!("Server:   {}", server_addr);
            println!(
                "Chunks:   {} to {} bytes\n",
                config.chunk_range.min_bytes(),
                config.chunk_range.max_bytes()
            );

            match client::transfer(&config, document, &mut sink, &mut rand::thread_rng())? {
                SessionOutcome::Completed(summary) => {
                    println!("\n✓ Exchange complete");
                    println!(
                        "  {} chunks plus {} remainder bits in {:?}",
                        summary.chunks, summary.remainder_bits, summary.elapsed
                    );
                    println!("  Reversed document: {:?}", output_path);
                }
                SessionOutcome::Denied(kind) => {
                    println!("\nServer clearance is not granted (answered {:?}).", kind);
                    println!("Aborting transfer.");
                }
            }
        }

        Commands::Serve { bind, max_chunks } => {
            println!("=== revex serve ===\n");

            let config = ServerConfig::new(bind).with_max_chunks(max_chunks);
            let server = Server::bind(config)?;

            println!("✓ Listening on {}", server.local_addr()?);
            if let Some(cap) = max_chunks {
                println!("✓ Refusing sessions above {} chunks", cap);
            }
            println!("Press Ctrl+C to stop\n");

            server.run()?;
        }
    }

    Ok(())
}
