use crate::error::{Error, Result};
use crate::kms::{KeyUriPolicy, KmsAead, KmsTransport};
use crate::plugins::gcp::GcpKmsClientBuilder;
use crate::registry::KmsClientRegistry;
use crate::{Aead, KmsClient};
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Prefix of Google Cloud KMS key URIs
pub const GCP_KEY_URI_PREFIX: &str = "gcp-kms://";

/// Number of leading ciphertext bytes not covered by tamper detection
///
/// Cloud KMS ciphertexts start with a short header. Byte 2 of that header is known to be
/// malleable: changing it can leave decryption successful. Only offsets at or beyond this
/// value are guaranteed to make a modified ciphertext fail to decrypt.
pub const GCP_MALLEABLE_PREFIX_LEN: usize = 3;

static KEY_NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

// Validates the resource part of a key URI against the Cloud KMS key name layout
pub(crate) fn validate_key_name(key_uri: &str, resource: &str) -> Result<()> {
    let pattern = KEY_NAME_PATTERN.get_or_init(|| {
        Regex::new(r"^projects/[^/]+/locations/[^/]+/keyRings/[^/]+/cryptoKeys/[^/]+$")
            .expect("Failed to create regex pattern for Cloud KMS key names")
    });

    if pattern.is_match(resource) {
        Ok(())
    } else {
        Err(Error::MalformedUri(format!(
            "{} is not a Cloud KMS key name (projects/*/locations/*/keyRings/*/cryptoKeys/*)",
            key_uri
        )))
    }
}

/// Google Cloud KMS client
///
/// Bound to one key URI, or serving every `gcp-kms://` URI when created with an empty one.
#[derive(Debug, Clone)]
pub struct GcpKmsClient {
    /// Which key URIs this client serves
    policy: KeyUriPolicy,

    /// Transport shared with every primitive this client creates
    transport: Arc<dyn KmsTransport>,
}

impl GcpKmsClient {
    /// Creates a client from a key URI (empty for an unbound client) and a credential file
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedUri`] if `key_uri` is non-empty and not a Cloud KMS key URI
    /// - [`Error::Credential`] if the credential file cannot be read or parsed
    pub fn new(key_uri: &str, credential_path: impl AsRef<Path>) -> Result<Self> {
        GcpKmsClientBuilder::new()
            .with_key_uri(key_uri)
            .with_credential_path(credential_path)
            .build()
    }

    /// Returns a builder for advanced configuration
    pub fn builder() -> GcpKmsClientBuilder {
        GcpKmsClientBuilder::new()
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

impl KmsClient for GcpKmsClient {
    fn does_support(&self, key_uri: &str) -> bool {
        self.policy.supports(key_uri)
    }

    fn get_aead(&self, key_uri: &str) -> Result<Box<dyn Aead>> {
        self.policy.check(key_uri)?;
        let resource = self.policy.resource(key_uri)?;
        validate_key_name(key_uri, resource)?;

        Ok(Box::new(KmsAead::new(
            key_uri,
            resource,
            self.transport.clone(),
        )))
    }

    fn bound_key_uri(&self) -> Option<&str> {
        self.policy.bound_key_uri()
    }
}
