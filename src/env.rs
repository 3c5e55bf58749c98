//! Defines the environment variables to use.

#![cfg(feature = "env")]

use crate::static_lazy_lock;

use std::env;

/// Parses an environment variable from [`String`] to something else, wrapping any error in [`anyhow::Error`].
#[macro_export]
macro_rules! parse_env {
    ($key:expr => |$var:ident| $expr:expr) => {
        std::env::var($key)
            .map_err(|e| anyhow::anyhow!(e))
            .and_then(|$var| $expr)
    };
    ($key:expr => |$var:ident| $expr:expr; anyhow) => {
        parse_env!($key => |$var| $expr.map_err(|e| anyhow::anyhow!(e)))
    };
}

pub use parse_env;

/// The REST endpoint used when neither a flag nor the runner provides one.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

static_lazy_lock! {
    /// The GitHub REST endpoint, as exported by Actions runners (`GITHUB_API_URL`).
    ///
    /// Falls back to [`DEFAULT_GITHUB_API_URL`] when unset or empty.
    pub GITHUB_API_URL: String = env::var("GITHUB_API_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_owned());
}

#[cfg(feature = "env_max_retries")]
static_lazy_lock! {
    /// The maximum number of retries after a request hits the primary rate limit.
    ///
    /// Read from `MAX_RETRIES`, defaulting to a single retry.
    pub MAX_RETRIES: u8 = parse_env!("MAX_RETRIES" => |s| s.trim().parse::<u8>(); anyhow).unwrap_or(1);
}
