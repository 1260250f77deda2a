use crate::error::{Error, Result};
use crate::kms::{KeyUriPolicy, KmsAead, KmsTransport};
use crate::{Aead, KmsClient};
use aes_gcm::{
    aead::{Aead as AeadTrait, KeyInit, Payload},
    Aes256Gcm, Key as AesKey, Nonce,
};
use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Key URI prefix conventionally used with [`StaticKmsClient`]
pub const STATIC_KEY_URI_PREFIX: &str = "static-kms://";

const ENVELOPE_VERSION: u8 = 1;
const MASTER_KEY_SIZE: usize = 32;
const GCM_NONCE_SIZE: usize = 12;
const GCM_TAG_SIZE: usize = 16;

/// A static key management service for testing
///
/// Encrypts in process with AES-256-GCM under a fixed master key, which is useful for tests
/// and local development but must not be used in production. The envelope is
/// `[version][nonce][ciphertext + tag]`; the key resource is authenticated together with the
/// associated data, so a ciphertext only opens under the key it was produced for. Every byte
/// of the envelope is covered by the integrity check.
pub struct StaticKmsTransport {
    /// The static master key
    master_key: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for StaticKmsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKmsTransport").finish_non_exhaustive()
    }
}

impl StaticKmsTransport {
    /// Creates a new StaticKmsTransport with the given 32-byte master key
    pub fn new(master_key: Vec<u8>) -> Result<Self> {
        if master_key.len() != MASTER_KEY_SIZE {
            return Err(Error::Credential(format!(
                "static master key must be {} bytes, got {}",
                MASTER_KEY_SIZE,
                master_key.len()
            )));
        }

        Ok(Self {
            master_key: Zeroizing::new(master_key),
        })
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(&self.master_key))
    }
}

// Authenticated data: length-prefixed key resource followed by the caller's associated data
fn bound_aad(key_resource: &str, associated_data: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(8 + key_resource.len() + associated_data.len());
    aad.extend_from_slice(&(key_resource.len() as u64).to_be_bytes());
    aad.extend_from_slice(key_resource.as_bytes());
    aad.extend_from_slice(associated_data);
    aad
}

#[async_trait]
impl KmsTransport for StaticKmsTransport {
    async fn encrypt(
        &self,
        key_resource: &str,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0_u8; GCM_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let aad = bound_aad(key_resource, associated_data);
        let sealed = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|e| Error::Transport(format!("static encrypt failed: {}", e)))?;

        let mut envelope = Vec::with_capacity(1 + GCM_NONCE_SIZE + sealed.len());
        envelope.push(ENVELOPE_VERSION);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&sealed);

        Ok(envelope)
    }

    async fn decrypt(
        &self,
        key_resource: &str,
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext.len() < 1 + GCM_NONCE_SIZE + GCM_TAG_SIZE {
            return Err(Error::Transport("ciphertext too short".into()));
        }

        if ciphertext[0] != ENVELOPE_VERSION {
            return Err(Error::Transport(format!(
                "unknown envelope version {}",
                ciphertext[0]
            )));
        }

        let (nonce, sealed) = ciphertext[1..].split_at(GCM_NONCE_SIZE);
        let aad = bound_aad(key_resource, associated_data);

        self.cipher()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: &aad,
                },
            )
            .map_err(|e| Error::Transport(format!("static decrypt failed: {}", e)))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// A [`KmsClient`] that pairs a [`KeyUriPolicy`] with any transport
///
/// Mostly used with [`StaticKmsTransport`]. The key resource handed to the transport is the
/// key URI without the policy's prefix.
#[derive(Debug, Clone)]
pub struct StaticKmsClient {
    policy: KeyUriPolicy,
    transport: Arc<dyn KmsTransport>,
}

impl StaticKmsClient {
    /// Creates a client serving the URIs accepted by `policy`
    pub fn new(policy: KeyUriPolicy, transport: Arc<dyn KmsTransport>) -> Self {
        Self { policy, transport }
    }

    /// Creates a client bound to `key_uri` or, if it is empty, serving every `static-kms://` URI
    pub fn with_master_key(key_uri: &str, master_key: Vec<u8>) -> Result<Self> {
        let policy = KeyUriPolicy::from_key_uri(STATIC_KEY_URI_PREFIX, key_uri)?;
        let transport = Arc::new(StaticKmsTransport::new(master_key)?);

        Ok(Self::new(policy, transport))
    }
}

impl KmsClient for StaticKmsClient {
    fn does_support(&self, key_uri: &str) -> bool {
        self.policy.supports(key_uri)
    }

    fn get_aead(&self, key_uri: &str) -> Result<Box<dyn Aead>> {
        self.policy.check(key_uri)?;
        let resource = self.policy.resource(key_uri)?;

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
