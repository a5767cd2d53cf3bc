// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides whether a service account needs a dockercfg secret and drives it
//! to referencing exactly one.

use crate::config::TokenWaitConfig;
use crate::dockercfg::{
    create_dockercfg_secret, create_pull_secret_reference, generated_dockercfg_secrets,
    service_account_key,
};
use crate::error::Result;
use crate::kubernetes::delete_secret_if_exists;
use crate::types::DockerUrl;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Stateless reconciler: everything it acts on comes from the service
/// account passed in and fresh reads from the API server.
pub struct DockercfgReconciler {
    client: Client,
    docker_url: Arc<DockerUrl>,
    token_wait: TokenWaitConfig,
}

impl DockercfgReconciler {
    pub fn new(client: Client, docker_url: Arc<DockerUrl>, token_wait: TokenWaitConfig) -> Self {
        Self {
            client,
            docker_url,
            token_wait,
        }
    }

    /// Make sure `sa` references one generated dockercfg secret both as a
    /// mountable secret and as an image pull secret.
    ///
    /// Conflicts end the attempt without error; the update that caused them
    /// triggers another reconciliation.
    #[instrument(
        skip(self, sa),
        fields(service_account = %format!("{}/{}", sa.namespace().unwrap_or_default(), sa.name_any()))
    )]
    pub async fn reconcile_if_needed(&self, sa: &ServiceAccount) -> Result<()> {
        let (namespace, name) = service_account_key(sa)?;
        let service_accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), &namespace);

        let generated = generated_dockercfg_secrets(sa);
        if !generated.mountable.is_empty() && !generated.image_pull.is_empty() {
            debug!("Dockercfg secret already referenced");
            return Ok(());
        }

        // referenced from one list only, link the same secret into the other
        if let Some(existing) = generated
            .mountable
            .first()
            .or_else(|| generated.image_pull.first())
        {
            debug!("Repairing partial reference to {}", existing);
            return match create_pull_secret_reference(&service_accounts, sa, existing).await {
                Err(e) if e.is_conflict() => {
                    debug!("Skipping reference repair: {}", e);
                    Ok(())
                }
                result => result,
            };
        }

        // creating a secret is expensive, make sure this view is current first
        let live = service_accounts.get(&name).await?;
        if live.resource_version() != sa.resource_version() {
            debug!("View of service account is not up to date, skipping dockercfg creation");
            return Ok(());
        }

        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        let dockercfg_secret =
            create_dockercfg_secret(&secrets, sa, &self.docker_url, &self.token_wait).await?;
        let dockercfg_name = dockercfg_secret.name_any();

        match create_pull_secret_reference(&service_accounts, sa, &dockercfg_name).await {
            Err(e) if e.is_conflict() => {
                // the token secret goes away with the dockercfg secret
                info!("Deleting dockercfg secret {} ({})", dockercfg_name, e);
                delete_secret_if_exists(&secrets, &dockercfg_name).await;
                Ok(())
            }
            result => result,
        }
    }
}
