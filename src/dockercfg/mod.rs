// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generation and linking of dockercfg secrets for service accounts.

pub mod bundle;
pub mod classify;
pub mod link;
pub mod reconcile;
pub mod token;

pub use bundle::create_dockercfg_secret;
pub use classify::{generated_dockercfg_secrets, GeneratedSecrets};
pub use link::create_pull_secret_reference;
pub use reconcile::DockercfgReconciler;
pub use token::create_token_secret;

use crate::error::{DockercfgError, Result};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::ResourceExt;

/// Namespace and name of a service account, both required to address it
pub(crate) fn service_account_key(sa: &ServiceAccount) -> Result<(String, String)> {
    let namespace = sa
        .namespace()
        .ok_or(DockercfgError::MissingField("metadata.namespace"))?;
    let name = sa
        .metadata
        .name
        .clone()
        .ok_or(DockercfgError::MissingField("metadata.name"))?;
    Ok((namespace, name))
}
