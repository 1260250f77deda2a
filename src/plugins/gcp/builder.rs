use crate::error::Result;
use crate::kms::{KeyUriPolicy, KmsTransport};
use crate::plugins::gcp::client::validate_key_name;
use crate::plugins::gcp::{
    GcpCredential, GcpKmsClient, GcpKmsRestTransport, DEFAULT_GCP_KMS_ENDPOINT,
    GCP_KEY_URI_PREFIX,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for Cloud KMS requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`GcpKmsClient`]
///
/// # Examples
///
/// ```no_run
/// use kmsaead::plugins::gcp::GcpKmsClientBuilder;
/// use std::time::Duration;
///
/// let client = GcpKmsClientBuilder::new()
///     .with_key_uri("gcp-kms://projects/p/locations/global/keyRings/r/cryptoKeys/k")
///     .with_credential_path("/etc/secrets/credential.json")
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok::<(), kmsaead::Error>(())
/// ```
#[derive(Debug)]
pub struct GcpKmsClientBuilder {
    /// Key URI to bind to; empty for an unbound client
    key_uri: String,

    /// Credential file; empty to use `GOOGLE_APPLICATION_CREDENTIALS`
    credential_path: PathBuf,

    /// Cloud KMS endpoint
    endpoint: String,

    /// Request timeout
    timeout: Duration,

    /// Transport to use instead of the REST transport
    transport: Option<Arc<dyn KmsTransport>>,
}

impl Default for GcpKmsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GcpKmsClientBuilder {
    /// Creates a builder for an unbound client using the default endpoint
    pub fn new() -> Self {
        Self {
            key_uri: String::new(),
            credential_path: PathBuf::new(),
            endpoint: DEFAULT_GCP_KMS_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            transport: None,
        }
    }

    /// Binds the client to `key_uri`; an empty string leaves it unbound
    pub fn with_key_uri(mut self, key_uri: impl Into<String>) -> Self {
        self.key_uri = key_uri.into();
        self
    }

    /// Sets the credential file to load
    pub fn with_credential_path(mut self, path: impl AsRef<Path>) -> Self {
        self.credential_path = path.as_ref().to_path_buf();
        self
    }

    /// Overrides the Cloud KMS endpoint, e.g. for a regional or emulated service
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the timeout of each HTTP request, including token exchanges
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses `transport` instead of the REST transport
    ///
    /// No credential is loaded when a transport is supplied. This is primarily used for
    /// testing.
    pub fn with_transport(mut self, transport: Arc<dyn KmsTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client
    ///
    /// # Errors
    ///
    /// - [`crate::Error::MalformedUri`] if the key URI is set but not a Cloud KMS key URI
    /// - [`crate::Error::Credential`] if the credential cannot be loaded
    pub fn build(self) -> Result<GcpKmsClient> {
        let policy = KeyUriPolicy::from_key_uri(GCP_KEY_URI_PREFIX, &self.key_uri)?;
        if let Some(key_uri) = policy.bound_key_uri() {
            validate_key_name(key_uri, policy.resource(key_uri)?)?;
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let credential = GcpCredential::load(&self.credential_path)?;
                log::debug!(
                    "loaded {} credential for Cloud KMS client",
                    credential.kind()
                );
                Arc::new(GcpKmsRestTransport::new(
                    credential,
                    self.endpoint,
                    self.timeout,
                )?)
            }
        };

        Ok(GcpKmsClient::from_parts(policy, transport))
    }
}
