//! # Console Reader Binary
//!
//! Reads node output from stdin and prints one summary line per decoded
//! block on stdout. Logs go to stderr.
//!
//! ```text
//! near-node run 2>&1 | CONSOLE_READER_RPC_URL=http://localhost:3030 console-reader
//! ```

use std::env;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use console_reader::{
    BincodeBlockCodec, BlockMetaFetcher, BlockReader, ConsoleReader, ConsoleReaderConfig,
    NoFallbackFetcher, RpcBlockMetaFetcher,
};

fn init_logging() -> Result<()> {
    let level = env::var("CONSOLE_READER_LOG_LEVEL")
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let json = env::var("CONSOLE_READER_JSON_LOGS")
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false);

    let filter = EnvFilter::try_new(&level).context("Invalid log level")?;
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn build_fetcher(config: &ConsoleReaderConfig) -> Result<Arc<dyn BlockMetaFetcher>> {
    match &config.rpc_url {
        Some(url) => {
            info!(url = %url, "using node rpc as block meta fallback");
            let fetcher =
                RpcBlockMetaFetcher::new(url.clone(), Duration::from_secs(config.rpc_timeout_secs))
                    .context("Failed to build rpc fetcher")?;
            Ok(Arc::new(fetcher))
        }
        None => {
            info!("no rpc url configured, cache misses are fatal");
            Ok(Arc::new(NoFallbackFetcher))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = ConsoleReaderConfig::from_env();
    config.validate().context("Invalid configuration")?;

    let fetcher = build_fetcher(&config)?;
    let (mut reader, scanner) =
        ConsoleReader::spawn(tokio::io::stdin(), &config, BincodeBlockCodec, fetcher);

    let mut stdout = std::io::stdout().lock();
    let mut blocks = 0u64;
    while let Some(block) = reader.read_block().await.context("Reading block")? {
        writeln!(
            stdout,
            "#{} {} parent=#{} {} lib=#{}",
            block.number(),
            block.id(),
            block.header.prev_height,
            block.previous_id(),
            block.header.last_final_block_height,
        )?;
        blocks += 1;
    }

    let lines = scanner
        .await
        .context("Scanner task panicked")?
        .context("Scanning node output")?;

    info!(blocks, lines, skipped = reader.skipped_lines(), "console reader finished");
    Ok(())
}
