// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::info;

use dockercfg_controller::config::Config;
use dockercfg_controller::constants::CONTROLLER_NAME;
use dockercfg_controller::reconcilers::DockercfgController;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting {}", CONTROLLER_NAME);

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: default_docker_url={}, resync={:?}",
        config.default_docker_url, config.resync
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    Arc::new(DockercfgController::new(client, &config))
        .run()
        .await
}
