// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dockercfg secret creation

use crate::config::TokenWaitConfig;
use crate::constants::{annotations, secrets};
use crate::dockercfg::token::{create_token_secret, token_value};
use crate::error::Result;
use crate::kubernetes::dockercfg_secret_prefix;
use crate::types::DockerUrl;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::ByteString;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Create a new dockercfg secret for `sa`, backed by a fresh token secret.
///
/// If saving the dockercfg secret fails the token secret is left behind for
/// the token cleanup controller.
#[instrument(
    skip(secrets, sa, docker_url, wait),
    fields(service_account = %format!("{}/{}", sa.namespace().unwrap_or_default(), sa.name_any()))
)]
pub async fn create_dockercfg_secret(
    secrets: &Api<Secret>,
    sa: &ServiceAccount,
    docker_url: &DockerUrl,
    wait: &TokenWaitConfig,
) -> Result<Secret> {
    let token_secret = create_token_secret(secrets, sa, wait).await?;
    let token = String::from_utf8_lossy(token_value(&token_secret).unwrap_or_default());
    let dockercfg = docker_url.render(&token)?;

    let created = secrets
        .create(
            &PostParams::default(),
            &new_dockercfg_secret(sa, &token_secret.name_any(), dockercfg),
        )
        .await?;

    info!(
        "Created dockercfg secret {} from token secret {}",
        created.name_any(),
        token_secret.name_any()
    );
    Ok(created)
}

fn new_dockercfg_secret(sa: &ServiceAccount, token_secret_name: &str, dockercfg: Vec<u8>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            generate_name: Some(dockercfg_secret_prefix(sa)),
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
                (
                    annotations::TOKEN_SECRET_NAME.to_string(),
                    token_secret_name.to_string(),
                ),
            ])),
            ..Default::default()
        },
        type_: Some(secrets::DOCKERCFG_TYPE.to_string()),
        data: Some(BTreeMap::from([(
            secrets::DOCKERCFG_KEY.to_string(),
            ByteString(dockercfg),
        )])),
        ..Default::default()
    }
}
