// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Linking a dockercfg secret into a service account

use crate::dockercfg::classify::generated_dockercfg_secrets;
use crate::error::{DockercfgError, Result};
use k8s_openapi::api::core::v1::{LocalObjectReference, ObjectReference, ServiceAccount};
use kube::{api::PostParams, Api, ResourceExt};
use tracing::{debug, info, instrument};

/// Reference `dockercfg_secret_name` from both the secrets and image pull
/// secrets of the live service account.
///
/// The caller decided on the reference while looking at `stale`. If the live
/// object's generated secrets differ from what the caller saw, the decision
/// is rejected with `StaleReference`. The update carries the live
/// `resourceVersion`, so a write racing this one fails with a 409. Neither
/// case is retried here.
#[instrument(
    skip(service_accounts, stale),
    fields(service_account = %format!("{}/{}", stale.namespace().unwrap_or_default(), stale.name_any()))
)]
pub async fn create_pull_secret_reference(
    service_accounts: &Api<ServiceAccount>,
    stale: &ServiceAccount,
    dockercfg_secret_name: &str,
) -> Result<()> {
    let mut live = service_accounts.get(&stale.name_any()).await?;

    let live_generated = generated_dockercfg_secrets(&live);
    let decided = generated_dockercfg_secrets(stale);
    if decided != live_generated {
        return Err(DockercfgError::StaleReference {
            secret: dockercfg_secret_name.to_string(),
            decided,
            live: live_generated,
        });
    }

    let mut changed = false;
    if !live_generated.mountable.contains(dockercfg_secret_name) {
        live.secrets.get_or_insert_with(Vec::new).push(ObjectReference {
            name: Some(dockercfg_secret_name.to_string()),
            ..Default::default()
        });
        changed = true;
    }
    if !live_generated.image_pull.contains(dockercfg_secret_name) {
        live.image_pull_secrets
            .get_or_insert_with(Vec::new)
            .push(LocalObjectReference {
                name: dockercfg_secret_name.to_string(),
            });
        changed = true;
    }

    if !changed {
        debug!("Service account already references {}", dockercfg_secret_name);
        return Ok(());
    }

    // TODO: a conflict caused by fields other than the generated references
    // could be retried against a fresh read instead of dropping the attempt.
    service_accounts
        .replace(&live.name_any(), &PostParams::default(), &live)
        .await?;
    info!("Linked dockercfg secret {}", dockercfg_secret_name);
    Ok(())
}
