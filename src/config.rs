//! Declarative client configuration
//!
//! A configuration document lists the clients to register, in order:
//!
//! ```json
//! {
//!   "clients": [
//!     {
//!       "provider": "gcp-kms",
//!       "key_uri": "gcp-kms://projects/p/locations/global/keyRings/r/cryptoKeys/k",
//!       "credential_path": "/etc/secrets/gcp.json",
//!       "timeout_secs": 10
//!     },
//!     {
//!       "provider": "aws-kms",
//!       "credential_path": "/etc/secrets/aws-credentials",
//!       "profile": "kms"
//!     }
//!   ]
//! }
//! ```
//!
//! An empty or missing `key_uri` produces a client that serves every URI of its scheme.

use crate::error::{Error, Result};
use crate::KmsClient;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a set of KMS clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsConfig {
    /// Clients in registration order
    #[serde(default)]
    pub clients: Vec<KmsClientConfig>,
}

/// Configuration for one KMS client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "kebab-case")]
pub enum KmsClientConfig {
    /// Google Cloud KMS
    GcpKms {
        /// Key URI to bind the client to; empty for an unbound client
        #[serde(default)]
        key_uri: String,

        /// Path of the Google credential JSON file
        #[serde(default)]
        credential_path: PathBuf,

        /// Override of the Cloud KMS endpoint
        #[serde(default)]
        endpoint: Option<String>,

        /// Request timeout in seconds
        #[serde(default)]
        timeout_secs: Option<u64>,
    },

    /// AWS KMS
    AwsKms {
        /// Key URI to bind the client to; empty for an unbound client
        #[serde(default)]
        key_uri: String,

        /// Path of the AWS credentials file; empty for the SDK default provider chain
        #[serde(default)]
        credential_path: PathBuf,

        /// Profile to read from the credentials file
        #[serde(default)]
        profile: Option<String>,

        /// Override of the KMS endpoint URL
        #[serde(default)]
        endpoint: Option<String>,

        /// Request timeout in seconds
        #[serde(default)]
        timeout_secs: Option<u64>,

        /// Maximum attempts per request, including the first
        #[serde(default)]
        max_attempts: Option<u32>,
    },
}

impl KmsConfig {
    /// Parses a configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid KMS config: {}", e)))
    }

    /// Reads and parses a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("unable to read KMS config {}: {}", path.display(), e))
        })?;

        Self::from_json(&json)
    }

    /// Builds every configured client, in order
    pub fn build_clients(&self) -> Result<Vec<Arc<dyn KmsClient>>> {
        self.clients.iter().map(KmsClientConfig::build).collect()
    }
}

fn timeout(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}

impl KmsClientConfig {
    /// Builds the client described by this entry
    pub fn build(&self) -> Result<Arc<dyn KmsClient>> {
        match self {
            #[cfg(feature = "gcp-kms")]
            KmsClientConfig::GcpKms {
                key_uri,
                credential_path,
                endpoint,
                timeout_secs,
            } => {
                let mut builder = crate::plugins::gcp::GcpKmsClientBuilder::new()
                    .with_key_uri(key_uri.as_str())
                    .with_credential_path(credential_path);
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint.as_str());
                }
                if let Some(timeout) = timeout(*timeout_secs) {
                    builder = builder.with_timeout(timeout);
                }

                Ok(Arc::new(builder.build()?))
            }

            #[cfg(feature = "aws-kms")]
            KmsClientConfig::AwsKms {
                key_uri,
                credential_path,
                profile,
                endpoint,
                timeout_secs,
                max_attempts,
            } => {
                let mut builder = crate::plugins::aws::AwsKmsClientBuilder::new()
                    .with_key_uri(key_uri.as_str())
                    .with_credential_path(credential_path);
                if let Some(profile) = profile {
                    builder = builder.with_profile(profile.as_str());
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint.as_str());
                }
                if let Some(timeout) = timeout(*timeout_secs) {
                    builder = builder.with_timeout(timeout);
                }
                if let Some(max_attempts) = max_attempts {
                    builder = builder.with_max_attempts(*max_attempts);
                }

                Ok(Arc::new(builder.build()?))
            }

            #[allow(unreachable_patterns)]
            other => Err(Error::Config(format!(
                "{} support is not enabled in this build",
                other.provider()
            ))),
        }
    }

    /// The provider tag of this entry
    pub fn provider(&self) -> &'static str {
        match self {
            KmsClientConfig::GcpKms { .. } => "gcp-kms",
            KmsClientConfig::AwsKms { .. } => "aws-kms",
        }
    }
}
