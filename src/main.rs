mod config;
mod courier;
mod relocate;
mod report;
mod select;
mod stats;

use config::RunConfig;
use courier::{Courier, Message};
use dotenvy::dotenv;
use report::LogFileReporter;
use tokio::sync::mpsc::{channel, Sender};

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Could not initialize the tracing system!");

    match dotenv() {
        Ok(path) => tracing::info!("Loaded env file from {path:?}"),
        Err(e) => tracing::info!("No .env file loaded ({e}); using the process environment"),
    }

    let run_config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Bad configuration: {e}");
            return;
        }
    };

    let log_path = config::log_file_from_env();
    tracing::info!("Move log will be appended to {log_path:?}");

    tracing::info!("Starting the courier...");
    let (courier_tx, courier_rx) = channel(10);
    let handle = tokio::task::spawn(Courier::new(courier_rx, LogFileReporter::new(log_path)).run());

    if courier_tx.send(Message::Start(run_config)).await.is_err() {
        tracing::error!("Courier task ended before it could be started");
        return;
    }

    shutdown_signal(courier_tx).await;

    tracing::info!("Joining courier task...");
    match handle.await {
        Ok(summary) => match serde_json::to_string(&summary) {
            Ok(json) => tracing::info!("Courier gracefully shutdown. Final statistics: {json}"),
            Err(e) => tracing::error!("Could not serialize final statistics: {e}"),
        },
        Err(e) => tracing::error!("Courier task failed to join: {e}"),
    }
}

async fn shutdown_signal(courier_tx: Sender<Message>) {
    let ctrl_c_sig = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to handle ctrl-c")
    };

    #[cfg(unix)]
    let terminate_sig = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Could not hook to terminate signal.")
            .recv()
            .await
    };

    // No equivalent in windows?
    #[cfg(not(unix))]
    let terminate_sig = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c_sig => {
            tracing::info!("Shuting down due to ctrl-c...");
            courier_tx.send(Message::Shutdown).await.expect("Couldn't send shutdown to courier");
        }
        _ = terminate_sig => {
            tracing::info!("Shuting down due to terminate...");
            courier_tx.send(Message::Shutdown).await.expect("Couldn't send shutdown to courier");
        }
    }
}
