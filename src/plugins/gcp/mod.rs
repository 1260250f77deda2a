//! Google Cloud KMS plugin
//!
//! Key URIs have the form
//! `gcp-kms://projects/<project>/locations/<location>/keyRings/<ring>/cryptoKeys/<key>`.
//! Requests go to the Cloud KMS REST API authenticated with an OAuth2 access token minted
//! from a Google credential file (service account or authorized user).
//!
//! # Examples
//!
//! ```no_run
//! use kmsaead::plugins::gcp::GcpKmsClient;
//! use kmsaead::KmsClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key_uri = "gcp-kms://projects/p/locations/global/keyRings/r/cryptoKeys/k";
//!     let client = GcpKmsClient::new(key_uri, "/etc/secrets/credential.json")?;
//!
//!     let aead = client.get_aead(key_uri)?;
//!     let ciphertext = aead.encrypt(b"helloworld", b"").await?;
//!     assert_eq!(aead.decrypt(&ciphertext, b"").await?, b"helloworld");
//!
//!     Ok(())
//! }
//! ```

mod builder;
mod client;
mod credential;
mod transport;


pub use builder::GcpKmsClientBuilder;
pub use client::{GcpKmsClient, GCP_KEY_URI_PREFIX, GCP_MALLEABLE_PREFIX_LEN};
pub use credential::{GcpCredential, CLOUD_KMS_SCOPE, CREDENTIALS_ENV_VAR};
pub use transport::{GcpKmsRestTransport, DEFAULT_GCP_KMS_ENDPOINT};
