use crate::error::{Error, Result};
use crate::kms::KmsTransport;
use crate::plugins::gcp::GcpCredential;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Public Cloud KMS endpoint
pub const DEFAULT_GCP_KMS_ENDPOINT: &str = "https://cloudkms.googleapis.com";

// Tokens are refreshed this long before Google reports them expired
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncryptRequest {
    plaintext: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    additional_authenticated_data: String,
}

#[derive(Deserialize)]
struct EncryptResponse {
    ciphertext: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecryptRequest {
    ciphertext: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    additional_authenticated_data: String,
}

#[derive(Deserialize)]
struct DecryptResponse {
    // Omitted by the service when the plaintext is empty
    #[serde(default)]
    plaintext: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Zeroizing<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

struct CachedToken {
    value: Zeroizing<String>,
    refresh_at: DateTime<Utc>,
}

/// Cloud KMS transport over the REST API
///
/// Each request carries an OAuth2 access token obtained from the credential. The token is
/// cached and refreshed shortly before it expires; that cache is the only mutable state and
/// is guarded by an async mutex.
pub struct GcpKmsRestTransport {
    /// HTTP client, configured with the request timeout
    http: Client,

    /// Base URL of the Cloud KMS API
    endpoint: String,

    /// Credential used to mint access tokens
    credential: GcpCredential,

    /// Current access token
    token: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for GcpKmsRestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcpKmsRestTransport")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl GcpKmsRestTransport {
    /// Creates a transport for `endpoint` authenticating with `credential`
    pub fn new(
        credential: GcpCredential,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(http, credential, endpoint))
    }

    /// Creates a transport that sends its requests through `http`
    pub fn with_http_client(
        http: Client,
        credential: GcpCredential,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credential,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<Zeroizing<String>> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if now < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let form = self.credential.token_request(now)?;
        let response = self
            .http
            .post(self.credential.token_uri())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!(
                "token endpoint rejected {} credential: {}",
                self.credential.kind(),
                status
            );
            return Err(Error::Transport(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("invalid token response: {}", e)))?;

        let refresh_at = refresh_deadline(now, token.expires_in)?;
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            refresh_at,
        });

        Ok(value)
    }

    async fn call<Req, Resp>(&self, key_resource: &str, method: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let token = self.access_token().await?;
        let url = format!("{}/v1/{}:{}", self.endpoint, key_resource, method);

        let response = self
            .http
            .post(url)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Cloud KMS {} request failed: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => format!("{} {}", parsed.error.status, parsed.error.message),
                Err(_) => body,
            };
            return Err(Error::Transport(format!(
                "Cloud KMS {} returned {}: {}",
                method,
                status,
                detail.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("invalid Cloud KMS {} response: {}", method, e)))
    }
}

/// When a token issued at `now` with the reported `expires_in` must be replaced
///
/// The reported lifetime is clamped to at most a day; a lifetime shorter than the refresh
/// margin makes the token single-use.
pub(crate) fn refresh_deadline(now: DateTime<Utc>, expires_in: Option<i64>) -> Result<DateTime<Utc>> {
    let lifetime = expires_in
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
        .clamp(TOKEN_REFRESH_MARGIN_SECS, MAX_TOKEN_LIFETIME_SECS);

    TimeDelta::try_seconds(lifetime - TOKEN_REFRESH_MARGIN_SECS)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| Error::Transport(format!("token lifetime {}s out of range", lifetime)))
}

fn decode(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| Error::Transport(format!("invalid base64 in {}: {}", field, e)))
}

#[async_trait]
impl KmsTransport for GcpKmsRestTransport {
    async fn encrypt(
        &self,
        key_resource: &str,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let request = EncryptRequest {
            plaintext: STANDARD.encode(plaintext),
            additional_authenticated_data: STANDARD.encode(associated_data),
        };

        let response: EncryptResponse = self.call(key_resource, "encrypt", &request).await?;
        decode("ciphertext", &response.ciphertext)
    }

    async fn decrypt(
        &self,
        key_resource: &str,
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let request = DecryptRequest {
            ciphertext: STANDARD.encode(ciphertext),
            additional_authenticated_data: STANDARD.encode(associated_data),
        };

        let response: DecryptResponse = self.call(key_resource, "decrypt", &request).await?;
        decode("plaintext", &response.plaintext)
    }

    fn name(&self) -> &'static str {
        "gcp"
    }
}
