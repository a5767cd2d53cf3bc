// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generated name prefixes for a service account's secrets

use crate::constants::naming::{DOCKERCFG_SUFFIX, MAX_PREFIX_LENGTH, TOKEN_SUFFIX};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::ResourceExt;

/// Length of "-" plus an 8 character hash plus "-"
const HASH_SEGMENT_LENGTH: usize = 10;

/// Prefix shared by every dockercfg secret generated for `sa`
pub fn dockercfg_secret_prefix(sa: &ServiceAccount) -> String {
    name_prefix(&sa.name_any(), DOCKERCFG_SUFFIX, MAX_PREFIX_LENGTH)
}

/// Prefix shared by every token secret generated for `sa`
pub fn token_secret_prefix(sa: &ServiceAccount) -> String {
    name_prefix(&sa.name_any(), TOKEN_SUFFIX, MAX_PREFIX_LENGTH)
}

/// Join `base` and `suffix`, shortening `base` and inserting a hash of it
/// when the result would exceed `max_length`.
pub fn name_prefix(base: &str, suffix: &str, max_length: usize) -> String {
    let name = format!("{}-{}", base, suffix);
    if name.len() <= max_length {
        return name;
    }

    match max_length.checked_sub(HASH_SEGMENT_LENGTH + suffix.len()) {
        Some(base_length) => format!(
            "{}-{}-{}",
            truncate(base, base_length),
            fnv32a_hex(base),
            suffix
        ),
        // suffix alone is too long, drop it
        None => {
            let short = format!(
                "{}-{}",
                truncate(base, max_length.saturating_sub(9)),
                fnv32a_hex(&name)
            );
            truncate(&short, max_length).to_string()
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn fnv32a_hex(s: &str) -> String {
    let hash = s.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    });
    format!("{:08x}", hash)
}
