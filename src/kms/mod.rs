//! KMS-backed AEAD primitives and the transport seam they are built on
//!
//! - [`KmsTransport`]: the remote encrypt/decrypt calls of one key management service
//! - [`KmsAead`]: an [`crate::Aead`] bound to one key URI that forwards every call to a transport
//! - [`KeyUriPolicy`]: the rule deciding which key URIs a client serves
//! - [`StaticKmsTransport`]: an in-process transport for testing and development
//!
//! Remote transports live in the `plugins` module:
//! - Google Cloud KMS: `plugins::gcp`
//! - AWS KMS: `plugins::aws`

mod aead;
mod policy;
mod static_kms;

pub use aead::KmsAead;
pub use policy::KeyUriPolicy;
pub use static_kms::{StaticKmsClient, StaticKmsTransport, STATIC_KEY_URI_PREFIX};

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Remote encrypt/decrypt operations of a key management service
///
/// `key_resource` is the service-specific name of the key, i.e. the key URI without its
/// scheme prefix. Implementations report failures as [`crate::Error::Transport`] and must
/// not retry on their own beyond what their underlying client is configured to do.
#[async_trait]
pub trait KmsTransport: Send + Sync + fmt::Debug {
    /// Encrypts `plaintext` under the remote key, authenticating `associated_data`
    async fn encrypt(
        &self,
        key_resource: &str,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>>;

    /// Decrypts `ciphertext` under the remote key, verifying `associated_data`
    async fn decrypt(
        &self,
        key_resource: &str,
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>>;

    /// Short name of the service, used as a metrics label
    fn name(&self) -> &'static str;
}
