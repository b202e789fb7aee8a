//! Devmatch terminal client.

use std::{io, time::Duration};

use clap::Parser;
use devmatch_cli::{App, CliError};
use devmatch_client::{
    Runtime, RuntimeConfig,
    http::{EngineProtocol, HttpBackend, HttpConfig},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Swipe through developer profiles and get notified of matches.
#[derive(Debug, Parser)]
#[command(name = "devmatch", version, about)]
struct Args {
    /// Server root URL.
    #[arg(long, default_value = "http://localhost:3333")]
    server: String,

    /// Log in as this user on start.
    #[arg(long)]
    user: Option<String>,

    /// Deadline for candidate fetches and decision sends, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    request_timeout_ms: u64,

    /// Engine.IO revision of the match socket: 3 for Socket.IO 2 servers,
    /// 4 for Socket.IO 3 and later.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(3..=4))]
    engine_io: u8,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let request_timeout = Duration::from_millis(args.request_timeout_ms);
    let backend = HttpBackend::new(HttpConfig {
        base_url: args.server.clone(),
        request_timeout,
        engine_io: if args.engine_io == 4 { EngineProtocol::V4 } else { EngineProtocol::V3 },
        ..HttpConfig::default()
    })?;
    let config = RuntimeConfig { request_timeout, ..RuntimeConfig::default() };

    let (runtime, handle) = Runtime::new(backend, config);
    let runtime = tokio::spawn(runtime.run());
    info!(server = %args.server, "devmatch client started");

    let mut app = App::new(handle.clone(), io::stdout().lock());
    if let Some(user) = args.user {
        app.execute(devmatch_cli::Command::Login { identity: user }).await?;
    }
    let outcome = app.run(tokio::io::stdin()).await;

    handle.shutdown();
    if let Err(error) = runtime.await {
        warn!(%error, "runtime task failed");
    }
    outcome
}
