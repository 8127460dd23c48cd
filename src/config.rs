//! Configuration Management
//!
//! Account and token for vsts-reconcile, read from a config file and the
//! environment.

use crate::resource::SettleStrategy;
use crate::vsts::auth::Credential;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ACCOUNT_ENV: &str = "VSTS_ACCOUNT";
pub const TOKEN_ENV: &str = "VSTS_TOKEN";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// VSTS account (the `{account}` in `{account}.visualstudio.com`)
    #[serde(default)]
    pub account: Option<String>,
    /// Personal access token
    #[serde(default)]
    pub token: Option<String>,
    /// Override for `https://{account}.visualstudio.com/`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Override for the post-create settle delay
    #[serde(default)]
    pub settle_delay_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vsts-reconcile").join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        Ok(config.merge_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Environment variables win over the file
    pub fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(account) = lookup(ACCOUNT_ENV).filter(|v| !v.is_empty()) {
            self.account = Some(account);
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Validate once into the credential the transport needs
    pub fn credential(&self) -> Result<Credential> {
        let Some(account) = self.account.as_deref().filter(|a| !a.is_empty()) else {
            bail!("No VSTS account configured. Set {} or use --account", ACCOUNT_ENV);
        };
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            bail!("No VSTS token configured. Set {} or use --token", TOKEN_ENV);
        };
        Ok(Credential::new(account, token))
    }

    /// Base URL for the transport (CLI > config > account default)
    pub fn effective_base_url(&self, credential: &Credential) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| credential.base_url())
    }

    pub fn settle_strategy(&self) -> SettleStrategy {
        match self.settle_delay_secs {
            Some(secs) => SettleStrategy::fixed(Duration::from_secs(secs)),
            None => SettleStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn env_overrides_file() {
        let file = Config {
            account: Some("from-file".into()),
            token: Some("file-token".into()),
            ..Default::default()
        };
        let merged = file.merge_env(env(&[(ACCOUNT_ENV, "from-env")]));

        assert_eq!(merged.account.as_deref(), Some("from-env"));
        assert_eq!(merged.token.as_deref(), Some("file-token"));
    }

    #[test]
    fn empty_env_is_ignored() {
        let file = Config {
            account: Some("from-file".into()),
            ..Default::default()
        };
        let merged = file.merge_env(env(&[(ACCOUNT_ENV, "")]));
        assert_eq!(merged.account.as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_token_names_variable() {
        let config = Config {
            account: Some("contoso".into()),
            ..Default::default()
        };
        let err = config.credential().unwrap_err();
        assert!(err.to_string().contains(TOKEN_ENV));
    }

    #[test]
    fn credential_and_base_url() {
        let config = Config::default().merge_env(env(&[(ACCOUNT_ENV, "contoso"), (TOKEN_ENV, "pat")]));
        let credential = config.credential().unwrap();

        assert_eq!(credential.account(), "contoso");
        assert_eq!(
            config.effective_base_url(&credential),
            "https://contoso.visualstudio.com/"
        );
    }

    #[test]
    fn settle_delay_override() {
        let config = Config {
            settle_delay_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(config.settle_strategy().delay, Duration::from_secs(5));
        assert_eq!(Config::default().settle_strategy(), SettleStrategy::default());
    }

    #[test]
    fn parses_partial_json() {
        let config: Config = serde_json::from_str(r#"{"account": "contoso"}"#).unwrap();
        assert_eq!(config.account.as_deref(), Some("contoso"));
        assert!(config.token.is_none());
    }
}
