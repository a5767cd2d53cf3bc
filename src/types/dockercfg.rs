// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::dockercfg::{EMAIL, USERNAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Contents of a `.dockercfg` secret: registry endpoint to credentials
pub type DockerConfig = BTreeMap<String, DockerConfigEntry>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DockerConfigEntry {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl DockerConfigEntry {
    /// Entry authenticating as a service account with the given token
    pub fn for_token(token: &str) -> Self {
        Self {
            username: USERNAME.to_string(),
            password: token.to_string(),
            email: EMAIL.to_string(),
        }
    }
}

/// The registry endpoint written into generated dockercfg secrets.
///
/// Shared between the reconcile path and reconfiguration. The lock is only
/// held while reading or replacing the value, never across an API call.
#[derive(Debug)]
pub struct DockerUrl {
    url: RwLock<String>,
}

impl DockerUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
        }
    }

    pub fn set(&self, url: impl Into<String>) {
        *self.url.write().unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    pub fn get(&self) -> String {
        self.url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Render the serialized docker config for `token` under the current
    /// endpoint. A concurrent `set` cannot interleave with rendering.
    pub fn render(&self, token: &str) -> serde_json::Result<Vec<u8>> {
        let url = self.url.read().unwrap_or_else(PoisonError::into_inner);
        let config = DockerConfig::from([(url.clone(), DockerConfigEntry::for_token(token))]);
        serde_json::to_vec(&config)
    }
}
