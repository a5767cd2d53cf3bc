// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Best-effort secret cleanup

use k8s_openapi::api::core::v1::Secret;
use kube::{api::DeleteParams, Api};
use tracing::{debug, error, instrument};

/// Delete a secret, treating an already missing secret as success.
///
/// Any other failure is reported and swallowed: the caller has already
/// decided the secret is garbage and has nothing better to do with the error.
#[instrument(skip(secrets))]
pub async fn delete_secret_if_exists(secrets: &Api<Secret>, name: &str) {
    match secrets.delete(name, &DeleteParams::default()).await {
        Ok(_) => debug!("Deleted secret {}", name),
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Secret {} already gone", name)
        }
        Err(e) => error!("Failed to delete secret {}: {}", name, e),
    }
}
