use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// OAuth2 scope granting access to Cloud KMS
pub const CLOUD_KMS_SCOPE: &str = "https://www.googleapis.com/auth/cloudkms";

/// Environment variable consulted when no credential path is given
pub const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// On-disk Google credential formats
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialFile {
    ServiceAccount {
        client_email: String,
        private_key: Zeroizing<String>,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: Zeroizing<String>,
        refresh_token: Zeroizing<String>,
    },
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// A Google credential used to obtain Cloud KMS access tokens
///
/// Loaded once and never modified. Secret material is zeroed on drop and never printed by
/// `Debug`.
#[derive(Clone)]
pub enum GcpCredential {
    /// Service account key; tokens are obtained with a signed JWT assertion
    ServiceAccount {
        /// Service account e-mail, the assertion issuer
        client_email: String,
        /// Identifier of the signing key, sent as the JWT `kid`
        private_key_id: Option<String>,
        /// RSA signing key parsed from the credential's PEM
        signing_key: EncodingKey,
        /// OAuth2 token endpoint
        token_uri: String,
    },

    /// User credential from `gcloud auth application-default login`; tokens are refreshed
    AuthorizedUser {
        /// OAuth2 client id
        client_id: String,
        /// OAuth2 client secret
        client_secret: Zeroizing<String>,
        /// Long-lived refresh token
        refresh_token: Zeroizing<String>,
        /// OAuth2 token endpoint
        token_uri: String,
    },
}

impl fmt::Debug for GcpCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcpCredential::ServiceAccount {
                client_email,
                private_key_id,
                token_uri,
                ..
            } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("private_key_id", private_key_id)
                .field("token_uri", token_uri)
                .finish_non_exhaustive(),
            GcpCredential::AuthorizedUser {
                client_id,
                token_uri,
                ..
            } => f
                .debug_struct("AuthorizedUser")
                .field("client_id", client_id)
                .field("token_uri", token_uri)
                .finish_non_exhaustive(),
        }
    }
}

impl GcpCredential {
    /// Loads a credential file, or the file named by `GOOGLE_APPLICATION_CREDENTIALS` when
    /// `path` is empty
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() {
            return Self::from_file(path);
        }

        match std::env::var_os(CREDENTIALS_ENV_VAR) {
            Some(env_path) if !env_path.is_empty() => Self::from_file(env_path),
            _ => Err(Error::Credential(format!(
                "no credential path given and {} is not set",
                CREDENTIALS_ENV_VAR
            ))),
        }
    }

    /// Reads and parses a credential file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            Error::Credential(format!("unable to read {}: {}", path.display(), e))
        })?);

        Self::from_json(&json)
            .map_err(|e| Error::Credential(format!("{}: {}", path.display(), strip_kind(e))))
    }

    /// Parses a credential document
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialFile = serde_json::from_str(json)
            .map_err(|e| Error::Credential(format!("unsupported credential: {}", e)))?;

        match file {
            CredentialFile::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => {
                let signing_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
                    .map_err(|e| Error::Credential(format!("invalid private key: {}", e)))?;

                Ok(GcpCredential::ServiceAccount {
                    client_email: non_empty("client_email", client_email)?,
                    private_key_id,
                    signing_key,
                    token_uri: token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
                })
            }
            CredentialFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
            } => {
                if refresh_token.is_empty() {
                    return Err(Error::Credential("refresh_token is empty".into()));
                }

                Ok(GcpCredential::AuthorizedUser {
                    client_id: non_empty("client_id", client_id)?,
                    client_secret,
                    refresh_token,
                    token_uri: DEFAULT_TOKEN_URI.to_string(),
                })
            }
        }
    }

    /// Short description of the credential type
    pub fn kind(&self) -> &'static str {
        match self {
            GcpCredential::ServiceAccount { .. } => "service_account",
            GcpCredential::AuthorizedUser { .. } => "authorized_user",
        }
    }

    /// The OAuth2 endpoint tokens are requested from
    pub fn token_uri(&self) -> &str {
        match self {
            GcpCredential::ServiceAccount { token_uri, .. }
            | GcpCredential::AuthorizedUser { token_uri, .. } => token_uri,
        }
    }

    /// Form fields of an access token request issued at `now`
    pub(crate) fn token_request(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, Zeroizing<String>)>> {
        match self {
            GcpCredential::ServiceAccount {
                client_email,
                private_key_id,
                signing_key,
                token_uri,
            } => {
                let claims = AssertionClaims {
                    iss: client_email,
                    scope: CLOUD_KMS_SCOPE,
                    aud: token_uri,
                    iat: now.timestamp(),
                    exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
                };
                let mut header = Header::new(Algorithm::RS256);
                header.kid = private_key_id.clone();

                let assertion = jsonwebtoken::encode(&header, &claims, signing_key)
                    .map_err(|e| Error::Transport(format!("unable to sign assertion: {}", e)))?;

                Ok(vec![
                    ("grant_type", Zeroizing::new(JWT_BEARER_GRANT.to_string())),
                    ("assertion", Zeroizing::new(assertion)),
                ])
            }
            GcpCredential::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                ..
            } => Ok(vec![
                ("grant_type", Zeroizing::new("refresh_token".to_string())),
                ("client_id", Zeroizing::new(client_id.clone())),
                ("client_secret", client_secret.clone()),
                ("refresh_token", refresh_token.clone()),
            ]),
        }
    }
}

fn non_empty(field: &str, value: String) -> Result<String> {
    if value.is_empty() {
        Err(Error::Credential(format!("{} is empty", field)))
    } else {
        Ok(value)
    }
}

// Avoids "Credential error: path: Credential error: ..." when adding the path as context
fn strip_kind(err: Error) -> String {
    match err {
        Error::Credential(msg) => msg,
        other => other.to_string(),
    }
}
