//! Client configuration read from the environment.
//!
//! # Design
//! Each setting falls back to a default when its variable is unset or blank,
//! and the fallback is logged. `from_lookup` takes the variable source as a
//! function so tests never touch the process environment.

use std::env;
use std::path::PathBuf;

use tracing::info;

/// Production backend used when no URL is configured.
pub const DEFAULT_API_URL: &str = "https://personal-website-vercel-three.vercel.app";
pub const DEFAULT_SESSION_FILE: &str = ".portfolio-session.json";

/// Variables are checked in order; the first non-empty one wins.
const API_URL_VARS: [&str; 2] = ["PORTFOLIO_API_URL", "NEXT_PUBLIC_API_URL"];
const SESSION_FILE_VAR: &str = "PORTFOLIO_SESSION_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = API_URL_VARS
            .iter()
            .find_map(|key| var(*key))
            .unwrap_or_else(|| {
                info!("API URL not set, using default: {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            });

        let session_file = var(SESSION_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                info!("{SESSION_FILE_VAR} not set, using default: {DEFAULT_SESSION_FILE}");
                PathBuf::from(DEFAULT_SESSION_FILE)
            });

        Self {
            api_url,
            session_file,
        }
    }
}
