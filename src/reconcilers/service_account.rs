// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service account reconciler - watches ServiceAccounts and makes sure each
//! one has a dockercfg secret.

use crate::config::Config;
use crate::dockercfg::DockercfgReconciler;
use crate::error::{DockercfgError, Result};
use crate::types::DockerUrl;
use futures::{channel::mpsc, SinkExt, StreamExt};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

pub struct DockercfgController {
    client: Client,
    reconciler: DockercfgReconciler,
    docker_url: Arc<DockerUrl>,
    resync: Duration,
}

impl DockercfgController {
    pub fn new(client: Client, config: &Config) -> Self {
        let docker_url = Arc::new(DockerUrl::new(config.default_docker_url.clone()));
        let reconciler =
            DockercfgReconciler::new(client.clone(), docker_url.clone(), config.token_wait.clone());

        Self {
            client,
            reconciler,
            docker_url,
            resync: config.resync,
        }
    }

    /// Replace the registry endpoint. Every dockercfg secret rendered after
    /// this returns uses the new endpoint.
    pub fn set_docker_url(&self, url: impl Into<String>) {
        let url = url.into();
        info!("Setting docker URL to {}", url);
        self.docker_url.set(url);
    }

    /// Watch all service accounts until the process is asked to stop.
    ///
    /// Keep a clone of the `Arc` to call `set_docker_url` while running.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let service_accounts: Api<ServiceAccount> = Api::all(self.client.clone());
        let resync = self.resync;

        let mut controller =
            Controller::new(service_accounts, WatcherConfig::default()).shutdown_on_signal();
        if !resync.is_zero() {
            info!("Resyncing all service accounts every {:?}", resync);
            controller = controller.reconcile_all_on(resync_ticks(resync));
        }

        controller
            .run(reconcile, error_policy, self)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled service account: {:?}", o),
                    // already reported by error_policy
                    Err(e) => debug!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        info!("Service account controller stopped");
        Ok(())
    }
}

/// Emits once every `period` until the receiving controller goes away
fn resync_ticks(period: Duration) -> mpsc::Receiver<()> {
    let (mut tx, rx) = mpsc::channel(0);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Called for every added or updated service account, and on resync.
///
/// Never asks for a requeue: a service account that could not be converged
/// is picked up again on its next change or resync.
async fn reconcile(sa: Arc<ServiceAccount>, ctx: Arc<DockercfgController>) -> Result<Action> {
    debug!(
        "Reconciling service account: {}/{}",
        sa.namespace().unwrap_or_default(),
        sa.name_any()
    );

    ctx.reconciler.reconcile_if_needed(&sa).await?;
    Ok(Action::await_change())
}

fn error_policy(
    sa: Arc<ServiceAccount>,
    error: &DockercfgError,
    _ctx: Arc<DockercfgController>,
) -> Action {
    error!(
        "Failed to ensure dockercfg secret for {}/{}: {}",
        sa.namespace().unwrap_or_default(),
        sa.name_any(),
        error
    );
    Action::await_change()
}
