//! Runtime configuration.
//!
//! Every field has a default, so the bot runs without a config file. A YAML
//! file passed with `--config` overrides individual fields, and
//! `INVENTORY_SPREADSHEET_ID` / `INVENTORY_SHEET_NAME` override the sheet.
//! Secrets never live here: the bot token is read from the environment
//! variable named by `telegram.token_env`, and spreadsheet credentials from
//! the file at `credentials_path`.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{sheets, source::SheetLocation, telegram};

pub const SPREADSHEET_ID_ENV: &str = "INVENTORY_SPREADSHEET_ID";
pub const SHEET_NAME_ENV: &str = "INVENTORY_SHEET_NAME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub range: String,
    pub credentials_path: PathBuf,
    pub sheets_api_base: String,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub token_env: String,
    pub poll_timeout_secs: u64,
    pub retry_delay_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: "1Mu68FPwqR4U3gHgnuXtYAeQzgl6j2dXiOy9QzBqx-Vo".to_string(),
            sheet_name: "DALONG".to_string(),
            range: "A1:Z1000".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            sheets_api_base: sheets::DEFAULT_API_BASE.to_string(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: telegram::DEFAULT_API_BASE.to_string(),
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            poll_timeout_secs: 60,
            retry_delay_secs: 3,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Reading config file {path:?}"))?;
        Self::from_yaml_str(&contents).with_context(|| format!("Parsing config file {path:?}"))
    }

    /// Defaults, then the optional file, then environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(SPREADSHEET_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.spreadsheet_id = id.trim().to_string();
        }
        if let Some(name) = lookup(SHEET_NAME_ENV).filter(|v| !v.trim().is_empty()) {
            self.sheet_name = name.trim().to_string();
        }
    }

    pub fn location(&self) -> SheetLocation {
        SheetLocation {
            spreadsheet_id: self.spreadsheet_id.clone(),
            sheet_name: self.sheet_name.clone(),
            range: self.range.clone(),
        }
    }

    pub fn bot_token(&self) -> Result<String> {
        match env::var(&self.telegram.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => bail!(
                "{} environment variable is required",
                self.telegram.token_env
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            "sheet_name: OMBOR\ntelegram:\n  poll_timeout_secs: 5\n",
        )
        .expect("parse");
        assert_eq!(config.sheet_name, "OMBOR");
        assert_eq!(config.range, "A1:Z1000");
        assert_eq!(config.telegram.poll_timeout_secs, 5);
        assert_eq!(config.telegram.token_env, "TELEGRAM_BOT_TOKEN");
        assert_eq!(config.location().range_expr(), "OMBOR!A1:Z1000");
    }

    #[test]
    fn overrides_replace_sheet_identity() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            SPREADSHEET_ID_ENV => Some(" other-id ".to_string()),
            SHEET_NAME_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.spreadsheet_id, "other-id");
        assert_eq!(config.sheet_name, "DALONG");
    }

    #[test]
    fn missing_token_env_is_reported_by_name() {
        let mut config = AppConfig::default();
        config.telegram.token_env = "INVENTORY_BOT_TEST_TOKEN_UNSET".to_string();
        let err = config.bot_token().expect_err("unset");
        assert_eq!(
            err.to_string(),
            "INVENTORY_BOT_TEST_TOKEN_UNSET environment variable is required"
        );
    }
}
