use crate::error::Result;
use crate::kms::{KeyUriPolicy, KmsTransport};
use crate::plugins::aws::client::region_of;
use crate::plugins::aws::{
    AwsCredential, AwsKmsClient, AwsKmsSdkTransport, AWS_KEY_URI_PREFIX, DEFAULT_PROFILE,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`AwsKmsClient`]
///
/// # Examples
///
/// ```no_run
/// use kmsaead::plugins::aws::AwsKmsClientBuilder;
/// use std::time::Duration;
///
/// let client = AwsKmsClientBuilder::new()
///     .with_key_uri("aws-kms://arn:aws:kms:us-west-2:123456789012:key/abcd-1234")
///     .with_credential_path("/home/app/.aws/credentials")
///     .with_profile("kms")
///     .with_timeout(Duration::from_secs(5))
///     .with_max_attempts(3)
///     .build()?;
/// # Ok::<(), kmsaead::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct AwsKmsClientBuilder {
    /// Key URI to bind to; empty for an unbound client
    key_uri: String,

    /// Shared credentials file; empty to use the SDK default provider chain
    credential_path: PathBuf,

    /// Profile within the credentials file
    profile: Option<String>,

    /// Endpoint override
    endpoint: Option<String>,

    /// Operation timeout
    timeout: Option<Duration>,

    /// Maximum attempts per operation
    max_attempts: Option<u32>,

    /// Transport to use instead of the SDK transport
    transport: Option<Arc<dyn KmsTransport>>,
}

impl AwsKmsClientBuilder {
    /// Creates a builder for an unbound client using the SDK defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the client to `key_uri`; an empty string leaves it unbound
    pub fn with_key_uri(mut self, key_uri: impl Into<String>) -> Self {
        self.key_uri = key_uri.into();
        self
    }

    /// Sets the shared credentials file to load
    pub fn with_credential_path(mut self, path: impl AsRef<Path>) -> Self {
        self.credential_path = path.as_ref().to_path_buf();
        self
    }

    /// Selects the profile read from the credentials file (default `"default"`)
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Overrides the KMS endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the timeout for each operation and each attempt
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the maximum number of attempts per operation
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Uses `transport` instead of the SDK transport
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
    /// - [`crate::Error::MalformedUri`] if the key URI is set but not an AWS KMS key URI
    /// - [`crate::Error::Credential`] if the credentials file cannot be read
    pub fn build(self) -> Result<AwsKmsClient> {
        let policy = KeyUriPolicy::from_key_uri(AWS_KEY_URI_PREFIX, &self.key_uri)?;
        if let Some(key_uri) = policy.bound_key_uri() {
            region_of(policy.resource(key_uri)?)?;
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let credential = if self.credential_path.as_os_str().is_empty() {
                    log::debug!("using default AWS credential chain for KMS client");
                    None
                } else {
                    let profile = self.profile.as_deref().unwrap_or(DEFAULT_PROFILE);
                    Some(AwsCredential::from_file(&self.credential_path, profile)?)
                };

                Arc::new(AwsKmsSdkTransport::new(
                    credential,
                    self.endpoint,
                    self.timeout,
                    self.max_attempts,
                ))
            }
        };

        Ok(AwsKmsClient::from_parts(policy, transport))
    }
}
