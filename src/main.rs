//! CLI for hookhub
//!
//! Subcommands:
//! - `server`: declare infrastructure, start the consumers and serve commands
//! - `infra`: declare infrastructure, print its status and exit

use std::sync::Arc;

use clap::Parser;
use hookhub::app::App;
use hookhub::config::load_config;
use hookhub::transport::websocket::start_websocket_server;
use hookhub::utils::error::StartupError;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hookhub")]
enum Command {
    /// Start the command server and the webhook dispatchers
    Server,
    /// Declare the configured infrastructure and report what was created
    Infra,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            hookhub::utils::logging::init("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    hookhub::utils::logging::init(&settings.logging.level);

    let result = match cmd {
        Command::Server => run_server(settings).await,
        Command::Infra => run_infra(settings).await,
    };

    if let Err(e) = result {
        error!("hookhub failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_server(settings: hookhub::config::Settings) -> Result<(), StartupError> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app = Arc::new(App::build(settings)?);

    let (status, report) = app.prepare().await;
    info!(
        complete = status.is_complete(),
        reconciled = report.reconciled,
        channels = report.total,
        "Infrastructure prepared"
    );

    let consumer = tokio::spawn(app.consumer.clone().run());

    tokio::select! {
        result = start_websocket_server(&addr, app.clone()) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    consumer.abort();
    app.persistence.flush().await?;
    Ok(())
}

async fn run_infra(settings: hookhub::config::Settings) -> Result<(), StartupError> {
    let app = App::build(settings)?;
    let (status, report) = app.prepare().await;
    let summary = serde_json::json!({
        "infrastructure": status,
        "complete": status.is_complete(),
        "channels": app.reconciler.list_channels(),
        "reconciled": report,
    });
    println!("{summary:#}");
    Ok(())
}
