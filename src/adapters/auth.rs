use crate::config::WarehouseSettings;
use crate::utils::error::{ReportError, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// The metadata server is local to the VM; anything slower means it is not there.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the OAuth access token for BigQuery comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenSource {
    Static(String),
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },
    ServiceAccount {
        client_email: String,
        private_key: String,
        private_key_id: Option<String>,
        token_uri: String,
    },
    Metadata {
        host: String,
    },
}

#[derive(Debug, Deserialize)]
struct Keyfile {
    #[serde(rename = "type")]
    kind: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    token_uri: Option<String>,
    client_email: Option<String>,
    private_key: Option<String>,
    private_key_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

impl TokenSource {
    pub fn from_settings(settings: &WarehouseSettings) -> Result<Self> {
        if let Some(token) = &settings.access_token {
            return Ok(TokenSource::Static(token.clone()));
        }

        match &settings.keyfile {
            Some(path) => Self::from_keyfile(path),
            None => Ok(TokenSource::Metadata {
                host: settings.metadata_host.clone(),
            }),
        }
    }

    pub fn from_keyfile(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::connection(format!("cannot read credentials {}: {}", path.display(), e))
        })?;
        let keyfile: Keyfile = serde_json::from_str(&content).map_err(|e| {
            ReportError::connection(format!("malformed credentials {}: {}", path.display(), e))
        })?;

        let missing = |field: &str| {
            ReportError::connection(format!("credentials {} lack {}", path.display(), field))
        };
        let token_uri = keyfile
            .token_uri
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        match keyfile.kind.as_str() {
            "authorized_user" => Ok(TokenSource::AuthorizedUser {
                client_id: keyfile.client_id.ok_or_else(|| missing("client_id"))?,
                client_secret: keyfile.client_secret.ok_or_else(|| missing("client_secret"))?,
                refresh_token: keyfile.refresh_token.ok_or_else(|| missing("refresh_token"))?,
                token_uri,
            }),
            "service_account" => Ok(TokenSource::ServiceAccount {
                client_email: keyfile.client_email.ok_or_else(|| missing("client_email"))?,
                private_key: keyfile.private_key.ok_or_else(|| missing("private_key"))?,
                private_key_id: keyfile.private_key_id,
                token_uri,
            }),
            other => Err(ReportError::connection(format!(
                "unsupported credential type '{}' in {}",
                other,
                path.display()
            ))),
        }
    }

    pub async fn fetch_token(&self, client: &Client) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => {
                tracing::debug!("Refreshing user credentials at {}", token_uri);
                let params = [
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ];
                let request = client.post(token_uri).form(&params);
                read_token(request).await
            }
            TokenSource::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => {
                tracing::debug!("Exchanging service account assertion for {}", client_email);
                let assertion = sign_assertion(
                    client_email,
                    private_key,
                    private_key_id.as_deref(),
                    token_uri,
                    chrono::Utc::now().timestamp(),
                )?;
                let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
                let request = client.post(token_uri).form(&params);
                read_token(request).await
            }
            TokenSource::Metadata { host } => {
                let url = format!(
                    "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                    host
                );
                tracing::debug!("Requesting token from metadata server {}", host);
                let request = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .timeout(METADATA_TIMEOUT);
                read_token(request).await
            }
        }
    }
}

/// Signs the RS256 JWT-bearer assertion a service account trades for an access token.
pub(crate) fn sign_assertion(
    client_email: &str,
    private_key: &str,
    private_key_id: Option<&str>,
    token_uri: &str,
    issued_at: i64,
) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = private_key_id.map(str::to_string);

    let claims = AssertionClaims {
        iss: client_email.to_string(),
        scope: BIGQUERY_SCOPE.to_string(),
        aud: token_uri.to_string(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .map_err(|e| ReportError::connection(format!("invalid service account private key: {}", e)))?;
    encode(&header, &claims, &key)
        .map_err(|e| ReportError::connection(format!("cannot sign service account assertion: {}", e)))
}

async fn read_token(request: reqwest::RequestBuilder) -> Result<String> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ReportError::connection(format!("token request timed out: {}", e))
        } else {
            ReportError::connection(format!("token request failed: {}", e))
        }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ReportError::connection(format!("token response unreadable: {}", e)))?;

    if !status.is_success() {
        let reason = match serde_json::from_str::<TokenError>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("{}: {}", err.error, description),
                None => err.error,
            },
            Err(_) => format!("HTTP {}", status),
        };
        return Err(ReportError::connection(format!("authentication failed ({})", reason)));
    }

    serde_json::from_str::<TokenResponse>(&body)
        .map(|t| t.access_token)
        .map_err(|e| ReportError::connection(format!("token response malformed: {}", e)))
}
