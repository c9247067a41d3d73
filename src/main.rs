use anyhow::{Context, Result};
use recon_mcp::{
    CliOptions, Config, ReconServer, config::SourceKind, notice::NoticeLog, run,
    source::AnySource, types::LocationId,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::load_env()?;
    init_tracing(&config.log.rust_log);

    tracing::info!("Starting Recon MCP Server");

    let options = CliOptions::from_args();
    options.apply(&mut config);
    config.validate()?;

    let source = AnySource::from_config(&config.source).context("Failed to set up source")?;
    let server = ReconServer::new(
        source,
        config.reconcile.options(),
        NoticeLog::new(config.notice.notice_size),
        options.location.clone().map(LocationId::from),
    );

    if options.watch_snapshot {
        match (&config.source.kind, &config.source.snapshot_path) {
            (SourceKind::Snapshot, Some(path)) => server.start_snapshot_watching(path)?,
            _ => tracing::warn!("-w only applies to a snapshot source, ignoring"),
        }
    }

    let service_factory = move || {
        tracing::info!("Creating service instance");
        Ok(server.clone())
    };

    match config.transport.transport.as_str() {
        "stdio" => run::run_stdio_server(service_factory).await,
        "streamable-http" | "http" => {
            run::run_http_server(&config.transport.bind_address, service_factory).await
        }
        other => {
            tracing::error!("Unknown transport: {}", other);
            anyhow::bail!(
                "Unknown transport: {}. Use 'stdio' or 'streamable-http'",
                other
            )
        }
    }
}

fn init_tracing(rust_log: &str) {
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
