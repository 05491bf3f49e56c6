//! API key and endpoint resolution.
//!
//! The key comes from the command line (or `FW_API_KEY`), falling back to the
//! platform CLI's own login file at `~/.config/flywheel/user.json`.

use crate::Result;

use anyhow::{Context, bail};
use directories_next::BaseDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct UserConfig {
    key: String,
}

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub base_url: String,
}

impl Credentials {
    pub fn resolve(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let api_key = match api_key {
            Some(k) => k,
            None => {
                let path = user_config_path()
                    .context("no --api-key given and no home directory to look for a login")?;
                read_user_key(&path)?
            }
        };
        let base_url = match base_url {
            Some(u) => u,
            None => base_url_from_key(&api_key)?,
        };
        Ok(Self { api_key, base_url })
    }
}

fn user_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".config/flywheel/user.json"))
}

fn read_user_key(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("no --api-key given and cannot read {}", path.display()))?;
    let cfg: UserConfig = serde_json::from_str(&text)
        .with_context(|| format!("parse login file {}", path.display()))?;
    Ok(cfg.key)
}

/// `site.example.org:secret` -> `https://site.example.org/api`.
///
/// A port may sit between host and secret (`host:8443:secret`).
pub fn base_url_from_key(api_key: &str) -> Result<String> {
    match api_key.rsplit_once(':') {
        Some((site, secret)) if !site.is_empty() && !secret.is_empty() => {
            Ok(format!("https://{}/api", site))
        }
        _ => bail!("api key has no site prefix; pass --base-url"),
    }
}
