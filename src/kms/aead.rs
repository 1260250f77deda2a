use crate::error::{Error, Result};
use crate::kms::KmsTransport;
use crate::metrics;
use crate::timer;
use crate::Aead;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// AEAD primitive backed by one remote key
///
/// Holds nothing but the key URI, the service-side key resource and the transport shared with
/// the client that created it. Every call is a single remote request; failures are reported as
/// [`Error::Encryption`] or [`Error::Decryption`] and never retried here.
///
/// Ciphertexts are whatever the remote service returns. Whether a modified ciphertext is
/// detected depends on the service's envelope format; see the provider documentation for
/// offsets that are exempt (e.g. [`crate::plugins::gcp::GCP_MALLEABLE_PREFIX_LEN`]).
#[derive(Clone)]
pub struct KmsAead {
    key_uri: String,
    key_resource: String,
    transport: Arc<dyn KmsTransport>,
}

impl fmt::Debug for KmsAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmsAead")
            .field("key_uri", &self.key_uri)
            .field("kms", &self.transport.name())
            .finish()
    }
}

impl KmsAead {
    /// Creates a primitive for `key_uri`, whose service-side name is `key_resource`
    pub fn new(
        key_uri: impl Into<String>,
        key_resource: impl Into<String>,
        transport: Arc<dyn KmsTransport>,
    ) -> Self {
        Self {
            key_uri: key_uri.into(),
            key_resource: key_resource.into(),
            transport,
        }
    }
}

// Unwraps transport faults so the translated error reads "Encryption error: <uri>: <cause>"
fn cause(err: Error) -> String {
    match err {
        Error::Transport(msg) | Error::Encryption(msg) | Error::Decryption(msg) => msg,
        other => other.to_string(),
    }
}

#[async_trait]
impl Aead for KmsAead {
    async fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let _timer = timer!("kmsaead.encrypt", "kms" => self.transport.name());

        self.transport
            .encrypt(&self.key_resource, plaintext, associated_data)
            .await
            .map_err(|e| {
                log::debug!("KMS encrypt failed for key ({}): {}", self.key_uri, e);
                metrics::increment_failure("kmsaead.encrypt.failures", self.transport.name());
                Error::Encryption(format!("{}: {}", self.key_uri, cause(e)))
            })
    }

    async fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let _timer = timer!("kmsaead.decrypt", "kms" => self.transport.name());

        self.transport
            .decrypt(&self.key_resource, ciphertext, associated_data)
            .await
            .map_err(|e| {
                log::debug!("KMS decrypt failed for key ({}): {}", self.key_uri, e);
                metrics::increment_failure("kmsaead.decrypt.failures", self.transport.name());
                Error::Decryption(format!("{}: {}", self.key_uri, cause(e)))
            })
    }
}
