// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for generated names and secret cleanup.

pub mod names;
pub mod secrets;

pub use names::{dockercfg_secret_prefix, token_secret_prefix};
pub use secrets::delete_secret_if_exists;
