// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::kubernetes::dockercfg_secret_prefix;
use k8s_openapi::api::core::v1::ServiceAccount;
use std::collections::BTreeSet;
use std::fmt;

/// Generated dockercfg secrets referenced by a service account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedSecrets {
    /// Found in `secrets`
    pub mountable: BTreeSet<String>,
    /// Found in `imagePullSecrets`
    pub image_pull: BTreeSet<String>,
}

impl fmt::Display for GeneratedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?},{:?}", self.mountable, self.image_pull)
    }
}

/// Collect the references of `sa` carrying its dockercfg secret prefix
pub fn generated_dockercfg_secrets(sa: &ServiceAccount) -> GeneratedSecrets {
    let prefix = dockercfg_secret_prefix(sa);

    let mountable = sa
        .secrets
        .iter()
        .flatten()
        .filter_map(|s| s.name.as_deref())
        .filter(|name| name.starts_with(&prefix))
        .map(str::to_string)
        .collect();

    let image_pull = sa
        .image_pull_secrets
        .iter()
        .flatten()
        .map(|s| s.name.as_str())
        .filter(|name| name.starts_with(&prefix))
        .map(str::to_string)
        .collect();

    GeneratedSecrets {
        mountable,
        image_pull,
    }
}
