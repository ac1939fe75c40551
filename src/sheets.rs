//! Google Sheets `values.get` client.
//!
//! Fetches a fixed A1 range as rows of untyped cells. Authentication uses the
//! JSON credentials file Google issues, either a service account (signed JWT
//! assertion) or an authorized user (refresh token). The short-lived access
//! token is reused until shortly before it expires; table data is never cached.

use std::{path::Path, sync::Mutex, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{
    data::Cell,
    error::{InventoryError, InventoryResult},
    source::{RawTable, TabularSource},
};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const USER_AGENT: &str = concat!("inventory-bot/", env!("CARGO_PKG_VERSION"));

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
}

impl Credentials {
    pub fn load(path: &Path) -> InventoryResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            InventoryError::Credentials(format!("invalid credentials in {}: {e}", path.display()))
        })
    }

    fn token_uri(&self) -> &str {
        match self {
            Credentials::ServiceAccount { token_uri, .. }
            | Credentials::AuthorizedUser { token_uri, .. } => token_uri,
        }
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

enum Auth {
    Static(String),
    Credentials {
        credentials: Credentials,
        cached: Mutex<Option<CachedToken>>,
    },
}

pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    auth: Auth,
}

impl SheetsClient {
    pub fn from_credentials(api_base: &str, credentials: Credentials) -> InventoryResult<Self> {
        Self::build(
            api_base,
            Auth::Credentials {
                credentials,
                cached: Mutex::new(None),
            },
        )
    }

    pub fn from_credentials_file(api_base: &str, path: &Path) -> InventoryResult<Self> {
        Self::from_credentials(api_base, Credentials::load(path)?)
    }

    /// Client using a pre-issued bearer token, without any refresh.
    pub fn with_access_token(api_base: &str, token: &str) -> InventoryResult<Self> {
        Self::build(api_base, Auth::Static(token.to_string()))
    }

    fn build(api_base: &str, auth: Auth) -> InventoryResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InventoryError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn access_token(&self) -> InventoryResult<String> {
        let (credentials, cached) = match &self.auth {
            Auth::Static(token) => return Ok(token.clone()),
            Auth::Credentials {
                credentials,
                cached,
            } => (credentials, cached),
        };
        let mut guard = cached
            .lock()
            .map_err(|_| InventoryError::Credentials("token cache poisoned".to_string()))?;
        let now = Utc::now();
        if let Some(token) = guard.as_ref()
            && token.expires_at - TimeDelta::seconds(TOKEN_REFRESH_MARGIN_SECS) > now
        {
            return Ok(token.token.clone());
        }
        let fresh = self.request_token(credentials, now)?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    fn request_token(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> InventoryResult<CachedToken> {
        let form: Vec<(&str, String)> = match credentials {
            Credentials::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => {
                let claims = AssertionClaims {
                    iss: client_email,
                    scope: READONLY_SCOPE,
                    aud: token_uri,
                    iat: now.timestamp(),
                    exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
                };
                let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key.as_bytes())
                    .map_err(|e| {
                        InventoryError::Credentials(format!("invalid service account key: {e}"))
                    })?;
                let assertion = jsonwebtoken::encode(
                    &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
                    &claims,
                    &key,
                )
                .map_err(|e| InventoryError::Credentials(format!("cannot sign assertion: {e}")))?;
                vec![
                    ("grant_type", JWT_BEARER_GRANT.to_string()),
                    ("assertion", assertion),
                ]
            }
            Credentials::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                ..
            } => vec![
                ("grant_type", "refresh_token".to_string()),
                ("client_id", client_id.clone()),
                ("client_secret", client_secret.clone()),
                ("refresh_token", refresh_token.clone()),
            ],
        };

        debug!("Requesting access token from {}", credentials.token_uri());
        let response = self
            .http
            .post(credentials.token_uri())
            .form(&form)
            .send()
            .map_err(|e| InventoryError::Fetch(format!("token request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InventoryError::Fetch(format!(
                "token request rejected ({}): {body}",
                status.as_u16()
            )));
        }
        let token: TokenResponse = response
            .json()
            .map_err(|e| InventoryError::Fetch(format!("token response invalid: {e}")))?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        info!("Obtained spreadsheet access token valid for {lifetime}s");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + TimeDelta::seconds(lifetime),
        })
    }

    fn values_url(&self, sheet_id: &str, range_expr: &str) -> InventoryResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| {
                InventoryError::Fetch(format!("invalid API base '{}': {e}", self.api_base))
            })?;
        url.path_segments_mut()
            .map_err(|_| InventoryError::Fetch(format!("invalid API base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", sheet_id, "values", range_expr]);
        Ok(url)
    }
}

impl TabularSource for SheetsClient {
    fn fetch(&self, sheet_id: &str, range_expr: &str) -> InventoryResult<RawTable> {
        let url = self.values_url(sheet_id, range_expr)?;
        let token = self.access_token()?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .map_err(|e| InventoryError::Fetch(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InventoryError::Fetch(format!(
                "spreadsheet read failed ({}): {body}",
                status.as_u16()
            )));
        }
        let body: ValueRange = response
            .json()
            .map_err(|e| InventoryError::Fetch(format!("invalid values response: {e}")))?;
        Ok(parse_value_range(body))
    }
}

fn parse_value_range(body: ValueRange) -> RawTable {
    RawTable::new(
        body.values
            .iter()
            .map(|row| row.iter().map(Cell::from_json).collect())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_is_an_empty_table() {
        let body: ValueRange =
            serde_json::from_str(r#"{"range":"DALONG!A1:Z1000","majorDimension":"ROWS"}"#)
                .expect("parse");
        assert!(parse_value_range(body).is_empty());
    }

    #[test]
    fn credentials_are_tagged_by_type() {
        let creds: Credentials = serde_json::from_str(
            r#"{"type":"authorized_user","client_id":"id","client_secret":"s","refresh_token":"r"}"#,
        )
        .expect("parse");
        assert_eq!(creds.token_uri(), DEFAULT_TOKEN_URI);

        let creds: Credentials = serde_json::from_str(
            r#"{"type":"service_account","client_email":"bot@x.iam","private_key":"pem",
                "token_uri":"https://example.test/token","project_id":"p"}"#,
        )
        .expect("parse");
        assert_eq!(creds.token_uri(), "https://example.test/token");
    }

    #[test]
    fn values_url_encodes_range_segment() {
        let client =
            SheetsClient::with_access_token("https://sheets.example.test/", "tok").expect("client");
        let url = client
            .values_url("sheet-1", "My Sheet!A1:Z1000")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://sheets.example.test/v4/spreadsheets/sheet-1/values/My%20Sheet!A1:Z1000"
        );
    }
}
