//! # KMS-backed AEAD
//!
//! `kmsaead` provides AEAD (Authenticated Encryption with Associated Data) primitives whose
//! key material never leaves a remote key management service. Every `encrypt` and `decrypt`
//! call is forwarded to the service holding the key identified by a key URI.
//!
//! The crate is organized around three pieces:
//!
//! - [`KmsClient`]: authenticates to one KMS with a credential and decides which key URIs it
//!   serves. A client bound to a key URI serves exactly that URI; an unbound client serves any
//!   URI of its scheme.
//! - [`kms::KmsAead`]: the primitive returned by a client, bound to one key URI.
//! - [`registry::KmsClientRegistry`]: an ordered set of clients that resolves a key URI to the
//!   client that will serve it.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use kmsaead::plugins::gcp::GcpKmsClient;
//! use kmsaead::registry::KmsClientRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key_uri = "gcp-kms://projects/my-project/locations/global/keyRings/my-ring/cryptoKeys/my-key";
//!
//! let registry = KmsClientRegistry::new();
//! GcpKmsClient::register_client(&registry, key_uri, "/etc/secrets/credential.json")?;
//!
//! let aead = registry.get_aead(key_uri)?;
//! let ciphertext = aead.encrypt(b"hello", b"world").await?;
//! let plaintext = aead.decrypt(&ciphertext, b"world").await?;
//! assert_eq!(plaintext, b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Local development
//!
//! [`kms::StaticKmsTransport`] performs AES-256-GCM in process and can stand in for a remote
//! service in tests:
//!
//! ```rust
//! use kmsaead::kms::{KeyUriPolicy, StaticKmsTransport, StaticKmsClient};
//! use kmsaead::KmsClient;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> kmsaead::Result<()> {
//! let transport = Arc::new(StaticKmsTransport::new(vec![7u8; 32])?);
//! let client = StaticKmsClient::new(KeyUriPolicy::unbound("static-kms://"), transport);
//!
//! let aead = client.get_aead("static-kms://keys/one")?;
//! let ciphertext = aead.encrypt(b"helloworld", b"").await?;
//! assert_eq!(aead.decrypt(&ciphertext, b"").await?, b"helloworld");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod kms;
pub mod metrics;
pub mod registry;

// Provider integrations for remote key management services
pub mod plugins;

// Re-export key types
pub use crate::config::{KmsClientConfig, KmsConfig};
pub use crate::error::{Error, Result};
pub use crate::kms::{KeyUriPolicy, KmsAead, KmsTransport};
pub use crate::metrics::{disable_metrics, enable_metrics, metrics_enabled};
pub use crate::registry::KmsClientRegistry;

use async_trait::async_trait;
use std::fmt;

/// AEAD (Authenticated Encryption with Associated Data) interface
///
/// `associated_data` is authenticated but not encrypted and must be identical for
/// `encrypt` and the matching `decrypt`.
#[async_trait]
pub trait Aead: Send + Sync + fmt::Debug {
    /// Encrypts `plaintext`, binding it to `associated_data`
    async fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts `ciphertext`, failing if it or `associated_data` was altered
    async fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
}

/// A client for one key management service
///
/// Implementations hold their credential and transport for their whole lifetime and never
/// mutate them, so a client can be shared freely between threads.
pub trait KmsClient: Send + Sync + fmt::Debug {
    /// Returns true if this client would serve `key_uri`
    fn does_support(&self, key_uri: &str) -> bool;

    /// Returns an AEAD primitive backed by the remote key named by `key_uri`
    ///
    /// Fails with [`Error::KeyUri`] when `key_uri` is not served by this client.
    fn get_aead(&self, key_uri: &str) -> Result<Box<dyn Aead>>;

    /// The key URI this client is bound to, or `None` if it serves its whole scheme
    fn bound_key_uri(&self) -> Option<&str>;
}
