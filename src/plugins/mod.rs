//! Plugin architecture for remote key management services
//!
//! Each plugin provides a [`crate::KmsClient`] and the [`crate::KmsTransport`] it talks through.
//!
//! ## Available Plugins
//!
//! - `gcp`: Google Cloud KMS over its REST API (`gcp-kms://` key URIs)
//! - `aws`: AWS KMS using AWS SDK v2 (`aws-kms://` key URIs)
//!
//! ## Feature Flags
//!
//! - `gcp-kms`: Enables the Google Cloud KMS plugin (default)
//! - `aws-kms`: Enables the AWS KMS plugin (default)
//!
//! To build with only Google Cloud KMS support:
//! ```toml
//! [dependencies]
//! kmsaead = { version = "0.1.0", default-features = false, features = ["gcp-kms"] }
//! ```

#[cfg(feature = "gcp-kms")]
pub mod gcp;

#[cfg(feature = "aws-kms")]
pub mod aws;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_server;
