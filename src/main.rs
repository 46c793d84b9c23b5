//! This file defines the pivotist binary entry point.

use pivotist::app;
use pivotist::cli;
use pivotist::server;
use pivotist::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    ::tracing::info!("starting with {:?}", args);
    app::init(&args);
    let service = app::service(&args);
    server::serve(&args, service).await;
}
