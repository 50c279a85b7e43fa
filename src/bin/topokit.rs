//! Scripted topology server binary
//!
//! Seeds a scripted topology from configuration, keeps its topology server
//! busy with periodic metadata reads, and serves the resulting operation log
//! on `/querylogz`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use topokit::common::{init_tracing, Config};
use topokit::querylog::{querylogz_router, QueryLogState, QueryLogger};
use topokit::topo::{new_scripted_topo_server, ScriptedFactory};

#[derive(Parser)]
#[command(name = "topokit")]
#[command(about = "Scripted topology server with an operation log view")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the configured cells and serve /querylogz
    Serve {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address for HTTP
        #[arg(long, default_value = "127.0.0.1:15000")]
        bind: String,

        /// Extra cells to seed (comma-separated)
        #[arg(long, value_delimiter = ',')]
        cells: Vec<String>,

        /// Seconds between background metadata reads (0 disables them)
        #[arg(long, default_value = "1")]
        poll_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            cells,
            poll_secs,
        } => {
            let mut config = Config::load(config.as_deref())?;
            config.topo.cells.extend(cells);
            config.validate()?;
            init_tracing(&config.log_level);

            let factory = Arc::new(ScriptedFactory::from_config(&config.topo));
            let logger = QueryLogger::new(config.querylog.buffer_size);
            let ts = Arc::new(
                new_scripted_topo_server(factory)
                    .await
                    .with_query_log(logger.clone()),
            );
            let known = ts.get_known_cells().await?;
            tracing::info!(cells = ?known, "scripted topology ready");

            if poll_secs > 0 {
                let ts = Arc::clone(&ts);
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(Duration::from_secs(poll_secs));
                    loop {
                        ticker.tick().await;
                        let cells = match ts.get_known_cells().await {
                            Ok(cells) => cells,
                            Err(e) => {
                                tracing::warn!(error = %e, "listing cells failed");
                                continue;
                            }
                        };
                        for cell in &cells {
                            if let Err(e) = ts.get_cell_info(cell).await {
                                tracing::warn!(cell = %cell, error = %e, "reading cell info failed");
                            }
                        }
                    }
                });
            }

            let app = querylogz_router(QueryLogState::new(logger, config.querylog.clone()));
            let listener = tokio::net::TcpListener::bind(&bind).await?;
            tracing::info!(%bind, "serving /querylogz");
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}
