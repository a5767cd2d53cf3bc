// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::dockercfg::GeneratedSecrets;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockercfgError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error(
        "cannot add reference to {secret} based on stale data: decision made for {decided}, but live version is {live}"
    )]
    StaleReference {
        secret: String,
        decided: GeneratedSecrets,
        live: GeneratedSecrets,
    },

    #[error("token never generated for {0}")]
    TokenTimeout(String),

    #[error("Failed to serialize dockercfg: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Object is missing {0}")]
    MissingField(&'static str),
}

impl DockercfgError {
    /// True for optimistic concurrency failures, whether reported by the API
    /// server or detected locally on a stale decision.
    pub fn is_conflict(&self) -> bool {
        match self {
            DockercfgError::StaleReference { .. } => true,
            DockercfgError::KubeError(kube::Error::Api(err)) => err.code == 409,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DockercfgError::KubeError(kube::Error::Api(err)) if err.code == 404)
    }
}

pub type Result<T> = std::result::Result<T, DockercfgError>;
