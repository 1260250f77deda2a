use crate::error::{Error, Result};
use crate::kms::KmsTransport;
use crate::plugins::aws::client::region_of;
use crate::plugins::aws::AwsCredential;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::EncryptionAlgorithmSpec;
use aws_sdk_kms::Client as AwsSdkKmsClient;
use aws_types::region::Region;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;

/// Encryption context key that carries hex encoded associated data
pub const ADDITIONAL_DATA_CONTEXT_KEY: &str = "additionalData";

/// Encryption context for `associated_data`, or `None` when it is empty
pub(crate) fn encryption_context(associated_data: &[u8]) -> Option<(&'static str, String)> {
    if associated_data.is_empty() {
        None
    } else {
        Some((ADDITIONAL_DATA_CONTEXT_KEY, hex::encode(associated_data)))
    }
}

/// Checks the key id KMS reports for a decryption against the requested key ARN
///
/// Alias ARNs resolve to a key ARN, so only key ARNs are compared.
pub(crate) fn check_key_id(key_arn: &str, returned: Option<&str>) -> Result<()> {
    if key_arn.contains(":alias/") {
        return Ok(());
    }

    match returned {
        Some(key_id) if key_id != key_arn => Err(Error::Transport(format!(
            "ciphertext was decrypted with {} instead of the requested key",
            key_id
        ))),
        _ => Ok(()),
    }
}

/// AWS KMS transport using AWS SDK v2
///
/// SDK clients are built on first use, one per region named by a key ARN, and reused after.
pub struct AwsKmsSdkTransport {
    /// Credentials file profile; `None` uses the SDK default provider chain
    credential: Option<AwsCredential>,

    /// Endpoint override, e.g. for a local KMS emulator
    endpoint: Option<String>,

    /// Operation and attempt timeout
    timeout: Option<Duration>,

    /// Maximum attempts per operation, including the first
    max_attempts: Option<u32>,

    /// SDK clients keyed by region
    clients: Mutex<HashMap<String, AwsSdkKmsClient>>,
}

impl fmt::Debug for AwsKmsSdkTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsKmsSdkTransport")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl AwsKmsSdkTransport {
    /// Creates a transport; no SDK client is built until the first request
    pub fn new(
        credential: Option<AwsCredential>,
        endpoint: Option<String>,
        timeout: Option<Duration>,
        max_attempts: Option<u32>,
    ) -> Self {
        Self {
            credential,
            endpoint,
            timeout,
            max_attempts,
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client(&self, region: &str) -> AwsSdkKmsClient {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(region) {
            return client.clone();
        }

        let mut config_loader = aws_config::from_env().region(Region::new(region.to_string()));

        if let Some(credential) = &self.credential {
            config_loader = config_loader.credentials_provider(credential.provider());
        }

        if let Some(timeout) = self.timeout {
            config_loader = config_loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .operation_attempt_timeout(timeout)
                    .build(),
            );
        }

        if let Some(max_attempts) = self.max_attempts {
            config_loader =
                config_loader.retry_config(RetryConfig::standard().with_max_attempts(max_attempts));
        }

        if let Some(endpoint) = &self.endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let config = config_loader.load().await;
        let client = AwsSdkKmsClient::new(&config);

        log::debug!("created AWS KMS client for region {}", region);
        clients.insert(region.to_string(), client.clone());
        client
    }
}

#[async_trait]
impl KmsTransport for AwsKmsSdkTransport {
    async fn encrypt(
        &self,
        key_resource: &str,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let client = self.client(region_of(key_resource)?).await;

        let mut request = client
            .encrypt()
            .key_id(key_resource)
            .encryption_algorithm(EncryptionAlgorithmSpec::SymmetricDefault)
            .plaintext(Blob::new(plaintext.to_vec()));
        if let Some((key, value)) = encryption_context(associated_data) {
            request = request.encryption_context(key, value);
        }

        let result = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("KMS encrypt error: {}", e)))?;

        result
            .ciphertext_blob()
            .map(|b| b.as_ref().to_vec())
            .ok_or_else(|| Error::Transport("No ciphertext blob returned from KMS".into()))
    }

    async fn decrypt(
        &self,
        key_resource: &str,
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let client = self.client(region_of(key_resource)?).await;

        let mut request = client
            .decrypt()
            .key_id(key_resource)
            .encryption_algorithm(EncryptionAlgorithmSpec::SymmetricDefault)
            .ciphertext_blob(Blob::new(ciphertext.to_vec()));
        if let Some((key, value)) = encryption_context(associated_data) {
            request = request.encryption_context(key, value);
        }

        let result = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("KMS decrypt error: {}", e)))?;

        check_key_id(key_resource, result.key_id())?;

        result
            .plaintext()
            .map(|b| b.as_ref().to_vec())
            .ok_or_else(|| Error::Transport("No plaintext returned from KMS".into()))
    }

    fn name(&self) -> &'static str {
        "aws"
    }
}
