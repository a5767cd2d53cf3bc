// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Token secret creation and the wait for the token controller to fill it

use crate::config::TokenWaitConfig;
use crate::constants::{annotations, secrets, token_wait};
use crate::error::{DockercfgError, Result};
use crate::kubernetes::{delete_secret_if_exists, token_secret_prefix};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::{
    api::{ObjectMeta, PostParams},
    Api, ResourceExt,
};
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Create a token secret for `sa` and wait until its token is filled in.
///
/// The secret is polled `wait.retries` times after the first check. If the
/// token never shows up the secret is deleted and `TokenTimeout` returned.
#[instrument(
    skip(secrets, sa, wait),
    fields(service_account = %format!("{}/{}", sa.namespace().unwrap_or_default(), sa.name_any()))
)]
pub async fn create_token_secret(
    secrets: &Api<Secret>,
    sa: &ServiceAccount,
    wait: &TokenWaitConfig,
) -> Result<Secret> {
    let created = secrets
        .create(&PostParams::default(), &new_token_secret(sa))
        .await?;
    let name = created
        .metadata
        .name
        .ok_or(DockercfgError::MissingField("metadata.name"))?;
    debug!("Created token secret {}", name);

    for attempt in 0..=wait.retries {
        let live = secrets.get(&name).await?;
        if token_value(&live).is_some() {
            debug!("Token secret {} filled after {} checks", name, attempt + 1);
            return Ok(live);
        }

        if attempt < wait.retries {
            sleep(jittered(wait.interval, wait.jitter)).await;
        }
    }

    warn!("Deleting unfilled token secret {}", name);
    delete_secret_if_exists(secrets, &name).await;
    Err(DockercfgError::TokenTimeout(name))
}

/// The filled in token of a token secret, if any
pub fn token_value(secret: &Secret) -> Option<&[u8]> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(secrets::TOKEN_KEY))
        .map(|t| t.0.as_slice())
        .filter(|t| !t.is_empty())
}

fn new_token_secret(sa: &ServiceAccount) -> Secret {
    Secret {
        metadata: ObjectMeta {
            generate_name: Some(token_secret_prefix(sa)),
            namespace: sa.namespace(),
            annotations: Some(BTreeMap::from([
                (
                    annotations::SERVICE_ACCOUNT_NAME.to_string(),
                    sa.name_any(),
                ),
                (
                    annotations::SERVICE_ACCOUNT_UID.to_string(),
                    sa.uid().unwrap_or_default(),
                ),
            ])),
            ..Default::default()
        },
        type_: Some(secrets::SERVICE_ACCOUNT_TOKEN_TYPE.to_string()),
        data: Some(BTreeMap::new()),
        ..Default::default()
    }
}

/// `interval` plus a random extra of up to `interval * factor`.
/// Factors outside `(0, MAX_JITTER]` are clamped, NaN means no jitter.
fn jittered(interval: Duration, factor: f64) -> Duration {
    if factor.is_nan() || factor <= 0.0 {
        return interval;
    }
    let factor = factor.min(token_wait::MAX_JITTER);
    interval + interval.mul_f64(rand::thread_rng().gen_range(0.0..factor))
}
