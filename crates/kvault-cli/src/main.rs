//! kvault: move encrypted cluster-store backups between local files and
//! S3-compatible object stores.
//!
//! Commands:
//!   store <input> <dest>  - seal a plaintext JSON document into a backup
//!   fetch <src>           - fetch + verify a backup, emit the plaintext
//!   dump <src>            - fetch + verify and print to stdout
//!
//! Destinations/sources are local paths or URIs of the form
//! `s3://[user:pass@]bucket/key[?region=..&endpoint=..&secure=..&pathstyle=..]`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kvault_core::{encode_records, exclude_prefixes, parse_records, PathTransformer};
use kvault_crypto::SealMode;
use kvault_storage::{local, Transport};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "kvault",
    version,
    about = "Encrypted backup artifacts for cluster key/value stores",
    long_about = "kvault: seal, fetch, and inspect compressed, encrypted, \
                  independently-signed backup artifacts on local disk or S3"
)]
struct Cli {
    /// Passphrase for encryption and signature validation
    /// (prompted interactively when absent)
    #[arg(long, env = "KVAULT_KEY", global = true, hide_env_values = true)]
    key: Option<String>,

    /// Seal new artifacts with a random IV instead of the legacy
    /// zero-IV format (not readable by legacy tools)
    #[arg(long, global = true)]
    random_iv: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a plaintext JSON document and store the blob + signature pair
    Store {
        /// Plaintext document to seal
        input: PathBuf,
        /// Destination: local path or s3:// URI
        dest: String,
        /// Optional path transformation pairs (from,to,from,to...)
        #[arg(long)]
        transform: Option<String>,
        /// Optional comma-separated key prefixes to exclude
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Fetch and verify a backup, writing the plaintext out
    Fetch {
        /// Source: local path or s3:// URI
        src: String,
        /// Output file (mode 0600); stdout when absent
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Optional path transformation pairs applied to record keys
        #[arg(long)]
        transform: Option<String>,
    },

    /// Fetch and verify a backup and print it to stdout
    Dump {
        /// Source: local path or s3:// URI
        src: String,
        /// Decode the record document and print per-key lines instead
        /// of the raw JSON
        #[arg(long)]
        plain: bool,
    },
}

// ── entry point ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let passphrase = read_passphrase(cli.key)?;
    let mode = if cli.random_iv {
        SealMode::RandomIv
    } else {
        SealMode::LegacyZeroIv
    };
    let transport = Transport::new(mode);

    match cli.command {
        Commands::Store {
            input,
            dest,
            transform,
            exclude,
        } => cmd_store(&transport, &input, &dest, &passphrase, transform, exclude).await,
        Commands::Fetch { src, out, transform } => {
            cmd_fetch(&transport, &src, &passphrase, out, transform).await
        }
        Commands::Dump { src, plain } => cmd_dump(&transport, &src, &passphrase, plain).await,
    }
}

fn read_passphrase(flag: Option<String>) -> Result<SecretString> {
    if let Some(key) = flag {
        return Ok(SecretString::from(key));
    }
    let prompted =
        rpassword::prompt_password("Passphrase: ").context("reading passphrase from terminal")?;
    if prompted.is_empty() {
        bail!("empty passphrase");
    }
    Ok(SecretString::from(prompted))
}

// ── commands ───────────────────────────────────────────────────────────────────

async fn cmd_store(
    transport: &Transport,
    input: &Path,
    dest: &str,
    passphrase: &SecretString,
    transform: Option<String>,
    exclude: Option<String>,
) -> Result<()> {
    let mut plaintext = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;

    // exclusion and transformation only make sense for record documents,
    // so the document is only decoded when either was requested
    if transform.is_some() || exclude.is_some() {
        let mut records = parse_records(&plaintext)?;
        if let Some(excludes) = exclude {
            records = exclude_prefixes(records, &excludes);
            if records.is_empty() {
                bail!("no records left after exclusion");
            }
        }
        let transformer = PathTransformer::new(transform.as_deref().unwrap_or(""))?;
        let moved = transformer.apply(&mut records);
        if !moved.is_empty() {
            info!(relocated = moved.len(), "transformed record keys");
        }
        plaintext = encode_records(&records)?;
    }

    transport.store(dest, passphrase, &plaintext).await?;
    info!(dest, bytes = plaintext.len(), "backup stored");
    println!(
        "Keep your backup and signature objects in a safe place.\n\
         You will need both to restore your data."
    );
    Ok(())
}

async fn cmd_fetch(
    transport: &Transport,
    src: &str,
    passphrase: &SecretString,
    out: Option<PathBuf>,
    transform: Option<String>,
) -> Result<()> {
    let mut plaintext = transport.fetch(src, passphrase).await?;

    if let Some(pairs) = transform {
        let transformer = PathTransformer::new(&pairs)?;
        let mut records = parse_records(&plaintext)?;
        let moved = transformer.apply(&mut records);
        if !moved.is_empty() {
            info!(relocated = moved.len(), "transformed record keys");
        }
        plaintext = encode_records(&records)?;
    }

    match out {
        Some(path) => {
            local::write_object(&path, &plaintext).await?;
            info!(out = %path.display(), bytes = plaintext.len(), "plaintext written");
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&plaintext)?;
        }
    }
    Ok(())
}

async fn cmd_dump(
    transport: &Transport,
    src: &str,
    passphrase: &SecretString,
    plain: bool,
) -> Result<()> {
    let plaintext = transport.fetch(src, passphrase).await?;

    if !plain {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        stdout.write_all(&plaintext)?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }

    for record in parse_records(&plaintext)? {
        println!("Key: {}", record.key);
        println!("{}", String::from_utf8_lossy(&record.value));
    }
    Ok(())
}
