// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys written on generated secrets
pub mod annotations {
    /// Name of the service account owning the secret
    pub const SERVICE_ACCOUNT_NAME: &str = "kubernetes.io/service-account.name";
    /// UID of the service account owning the secret
    pub const SERVICE_ACCOUNT_UID: &str = "kubernetes.io/service-account.uid";
    /// Name of the token secret a dockercfg secret was generated from
    pub const TOKEN_SECRET_NAME: &str = "openshift.io/token-secret.name";
}

/// Secret types and data keys
pub mod secrets {
    pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";
    pub const DOCKERCFG_TYPE: &str = "kubernetes.io/dockercfg";
    /// Data key the token controller fills in
    pub const TOKEN_KEY: &str = "token";
    /// Data key holding the serialized docker config
    pub const DOCKERCFG_KEY: &str = ".dockercfg";
}

/// Fixed credentials written into every generated docker config entry
pub mod dockercfg {
    pub const USERNAME: &str = "serviceaccount";
    pub const EMAIL: &str = "serviceaccount@example.org";
}

/// Generated name limits
pub mod naming {
    /// Maximum length of a Kubernetes object name
    pub const MAX_NAME_LENGTH: usize = 63;
    /// Number of random characters the API server appends to a generateName
    pub const RANDOM_LENGTH: usize = 5;
    pub const MAX_PREFIX_LENGTH: usize = MAX_NAME_LENGTH - RANDOM_LENGTH;
    pub const DOCKERCFG_SUFFIX: &str = "dockercfg-";
    pub const TOKEN_SUFFIX: &str = "token-";
}

/// Token polling defaults
pub mod token_wait {
    pub const RETRIES: u32 = 100;
    pub const INTERVAL_MS: u64 = 20;
    pub const JITTER: f64 = 1.0;
    /// Largest accepted jitter factor
    pub const MAX_JITTER: f64 = 10.0;
}

/// The controller name used in logs
pub const CONTROLLER_NAME: &str = "dockercfg-controller";
