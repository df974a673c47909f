use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use redis_lite::{
    key_value_store::Store,
    rdb::load_snapshot,
    server::{self, Config, DEFAULT_DBFILENAME, DEFAULT_DIR, DEFAULT_PORT},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "A small Redis-compatible in-memory server")]
struct Args {
    /// The port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Directory holding the snapshot file
    #[arg(long, default_value = DEFAULT_DIR)]
    dir: String,

    /// Snapshot file name inside `dir`
    #[arg(long, default_value = DEFAULT_DBFILENAME)]
    dbfilename: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Arc::new(Config::new(args.dir, args.dbfilename));
    let store = Store::new();

    load_snapshot(&store, &config)
        .await
        .with_context(|| format!("failed to load {}", config.snapshot_path().display()))?;

    let listener = TcpListener::bind((args.bind.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.bind, args.port))?;

    server::run(listener, store, config).await?;

    Ok(())
}
