// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::token_wait;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Controller configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry endpoint written into newly generated dockercfg secrets
    pub default_docker_url: String,
    /// Interval at which all service accounts are re-listed. Zero disables resync.
    pub resync: Duration,
    pub token_wait: TokenWaitConfig,
}

/// Bounds for waiting on the token controller to fill a token secret
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWaitConfig {
    /// Number of polls after the first check
    pub retries: u32,
    pub interval: Duration,
    /// Each sleep is `interval` plus up to `interval * jitter`
    pub jitter: f64,
}

impl Default for TokenWaitConfig {
    fn default() -> Self {
        Self {
            retries: token_wait::RETRIES,
            interval: Duration::from_millis(token_wait::INTERVAL_MS),
            jitter: token_wait::JITTER,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_docker_url = var("DEFAULT_DOCKER_URL")
            .context("DEFAULT_DOCKER_URL environment variable not set")?;

        let resync_secs: u64 = parse_or(&var, "RESYNC_INTERVAL_SECS", 0)?;
        let token_wait = TokenWaitConfig {
            retries: parse_or(&var, "TOKEN_WAIT_RETRIES", token_wait::RETRIES)?,
            interval: Duration::from_millis(parse_or(
                &var,
                "TOKEN_WAIT_INTERVAL_MS",
                token_wait::INTERVAL_MS,
            )?),
            jitter: parse_or(&var, "TOKEN_WAIT_JITTER", token_wait::JITTER)?,
        };
        validate_jitter(token_wait.jitter)
            .with_context(|| format!("TOKEN_WAIT_JITTER has invalid value '{}'", token_wait.jitter))?;

        Ok(Config {
            default_docker_url,
            resync: Duration::from_secs(resync_secs),
            token_wait,
        })
    }
}

fn validate_jitter(jitter: f64) -> Result<()> {
    if !(0.0..=token_wait::MAX_JITTER).contains(&jitter) {
        anyhow::bail!("jitter must be between 0 and {}", token_wait::MAX_JITTER);
    }
    Ok(())
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", key, value)),
        None => Ok(default),
    }
}
