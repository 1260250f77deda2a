use crate::error::{Error, Result};
use crate::kms::{KeyUriPolicy, KmsAead, KmsTransport};
use crate::plugins::aws::AwsKmsClientBuilder;
use crate::registry::KmsClientRegistry;
use crate::{Aead, KmsClient};
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Prefix of AWS KMS key URIs
pub const AWS_KEY_URI_PREFIX: &str = "aws-kms://";

/// Number of leading ciphertext bytes not covered by tamper detection
///
/// No offset of an AWS KMS ciphertext blob is known to be malleable.
pub const AWS_MALLEABLE_PREFIX_LEN: usize = 0;

static KEY_ARN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn key_arn_pattern() -> &'static Regex {
    KEY_ARN_PATTERN.get_or_init(|| {
        Regex::new(r"^arn:aws[a-zA-Z-]*:kms:([a-z0-9-]+):\d{12}:(key|alias)/\S+$")
            .expect("Failed to create regex pattern for KMS key ARNs")
    })
}

/// Returns the region of a KMS key ARN
pub(crate) fn region_of(key_arn: &str) -> Result<&str> {
    key_arn_pattern()
        .captures(key_arn)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            Error::MalformedUri(format!(
                "{} is not a KMS key ARN (arn:<partition>:kms:<region>:<account>:key/<id>)",
                key_arn
            ))
        })
}

/// AWS KMS client
///
/// Bound to one key URI, or serving every `aws-kms://` URI when created with an empty one.
#[derive(Debug, Clone)]
pub struct AwsKmsClient {
    /// Which key URIs this client serves
    policy: KeyUriPolicy,

    /// Transport shared with every primitive this client creates
    transport: Arc<dyn KmsTransport>,
}

impl AwsKmsClient {
    /// Creates a client from a key URI (empty for an unbound client) and a credentials file
    ///
    /// An empty `credential_path` uses the AWS SDK default credential provider chain.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedUri`] if `key_uri` is non-empty and not an AWS KMS key URI
    /// - [`Error::Credential`] if the credentials file cannot be read or lacks the profile
    pub fn new(key_uri: &str, credential_path: impl AsRef<Path>) -> Result<Self> {
        AwsKmsClientBuilder::new()
            .with_key_uri(key_uri)
            .with_credential_path(credential_path)
            .build()
    }

    /// Returns a builder for advanced configuration
    pub fn builder() -> AwsKmsClientBuilder {
        AwsKmsClientBuilder::new()
    }

    /// Creates a client and appends it to `registry`
    pub fn register_client(
        registry: &KmsClientRegistry,
        key_uri: &str,
        credential_path: impl AsRef<Path>,
    ) -> Result<()> {
        let client = Self::new(key_uri, credential_path)?;
        registry.register(Arc::new(client));
        Ok(())
    }

    pub(crate) fn from_parts(policy: KeyUriPolicy, transport: Arc<dyn KmsTransport>) -> Self {
        Self { policy, transport }
    }
}

impl KmsClient for AwsKmsClient {
    fn does_support(&self, key_uri: &str) -> bool {
        self.policy.supports(key_uri)
    }

    fn get_aead(&self, key_uri: &str) -> Result<Box<dyn Aead>> {
        self.policy.check(key_uri)?;
        let key_arn = self.policy.resource(key_uri)?;
        region_of(key_arn)?;

        Ok(Box::new(KmsAead::new(
            key_uri,
            key_arn,
            self.transport.clone(),
        )))
    }

    fn bound_key_uri(&self) -> Option<&str> {
        self.policy.bound_key_uri()
    }
}
