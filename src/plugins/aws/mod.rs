//! AWS KMS plugin using AWS SDK v2
//!
//! Key URIs have the form `aws-kms://arn:<partition>:kms:<region>:<account>:key/<id>` (or
//! `.../alias/<name>`). Each request is sent to the region named in the key ARN; associated data
//! is passed as the encryption context `{"additionalData": hex(associated_data)}`.
//!
//! # Examples
//!
//! ```no_run
//! use kmsaead::plugins::aws::AwsKmsClient;
//! use kmsaead::KmsClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key_uri = "aws-kms://arn:aws:kms:us-west-2:123456789012:key/abcd-1234";
//!
//!     // An empty credential path uses the AWS SDK default provider chain
//!     let client = AwsKmsClient::new(key_uri, "")?;
//!
//!     let aead = client.get_aead(key_uri)?;
//!     let ciphertext = aead.encrypt(b"hello", b"world").await?;
//!     assert_eq!(aead.decrypt(&ciphertext, b"world").await?, b"hello");
//!
//!     Ok(())
//! }
//! ```

mod builder;
mod client;
mod credential;
mod transport;


pub use builder::AwsKmsClientBuilder;
pub use client::{AwsKmsClient, AWS_KEY_URI_PREFIX, AWS_MALLEABLE_PREFIX_LEN};
pub use credential::{AwsCredential, DEFAULT_PROFILE};
pub use transport::{AwsKmsSdkTransport, ADDITIONAL_DATA_CONTEXT_KEY};
