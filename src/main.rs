//! sealstream 命令行入口
//!
//! 用法：
//!   sealstream encrypt <input> <output> --nonce-seed <seed> [--chunk-size N]
//!   sealstream decrypt <input> <output> --nonce-seed <seed> [--chunk-size N]
//!
//! 设计原则：
//! - passphrase 来自 `--passphrase`、`SEALSTREAM_PASSPHRASE` 或交互输入
//! - 所有实际逻辑都委托给库

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use zeroize::Zeroizing;

use sealstream::{AeadAlgorithm, DEFAULT_CHUNK_SIZE, StreamConfig, decrypt_file, encrypt_file};

#[derive(Parser)]
#[command(name = "sealstream", version)]
#[command(about = "Chunked authenticated encryption for files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true, env = "SEALSTREAM_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[arg(
        long,
        global = true,
        env = "SEALSTREAM_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt INPUT into OUTPUT
    Encrypt(CryptArgs),

    /// Decrypt INPUT into OUTPUT
    Decrypt(CryptArgs),
}

#[derive(Args)]
struct CryptArgs {
    input: PathBuf,

    output: PathBuf,

    /// Seed for the per-chunk nonces; must match on both sides
    #[arg(long, env = "SEALSTREAM_NONCE_SEED", hide_env_values = true)]
    nonce_seed: String,

    /// Passphrase (prompted when omitted)
    #[arg(long, env = "SEALSTREAM_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Plaintext bytes per chunk; not stored in the output
    #[arg(long, env = "SEALSTREAM_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[arg(long, env = "SEALSTREAM_ALGORITHM", default_value_t = AeadAlgorithm::default())]
    algorithm: AeadAlgorithm,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl CryptArgs {
    fn config(&self) -> StreamConfig {
        StreamConfig::new(self.chunk_size).with_algorithm(self.algorithm)
    }

    fn passphrase(&mut self, confirm: bool) -> Result<Zeroizing<String>> {
        if let Some(p) = self.passphrase.take() {
            return Ok(Zeroizing::new(p));
        }

        let first = Zeroizing::new(
            rpassword::prompt_password("Passphrase: ").context("reading passphrase")?,
        );
        if confirm {
            let second = Zeroizing::new(
                rpassword::prompt_password("Confirm passphrase: ")
                    .context("reading passphrase")?,
            );
            if *first != *second {
                bail!("passphrases do not match");
            }
        }
        Ok(first)
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Encrypt(mut args) => {
            let passphrase = args.passphrase(true)?;
            encrypt_file(
                &args.input,
                &args.output,
                &passphrase,
                &args.nonce_seed,
                &args.config(),
            )
            .with_context(|| format!("encrypting {}", args.input.display()))?;
        }
        Commands::Decrypt(mut args) => {
            let passphrase = args.passphrase(false)?;
            decrypt_file(
                &args.input,
                &args.output,
                &passphrase,
                &args.nonce_seed,
                &args.config(),
            )
            .with_context(|| format!("decrypting {}", args.input.display()))?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    if let Err(e) = run(cli.command) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
