use thiserror::Error;

/// Result type for kmsaead operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when resolving or using KMS-backed primitives
#[derive(Error, Debug)]
pub enum Error {
    /// Credential missing, unreadable, or rejected while setting up a client
    #[error("Credential error: {0}")]
    Credential(String),

    /// Key URI does not match the expected scheme or shape
    #[error("Malformed key URI: {0}")]
    MalformedUri(String),

    /// Well-formed key URI that this client is not allowed to serve
    #[error("Key URI not supported by this client: {0}")]
    KeyUri(String),

    /// No registered client accepts the key URI
    #[error("No KMS client supports key URI: {0}")]
    NoSupportingClient(String),

    /// Remote encryption failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Remote decryption failed, including integrity and associated data mismatches
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Raw fault reported by a KMS transport
    ///
    /// [`crate::kms::KmsAead`] translates these into [`Error::Encryption`] or
    /// [`Error::Decryption`] before they reach callers of [`crate::Aead`].
    #[error("KMS transport error: {0}")]
    Transport(String),

    /// Invalid client configuration document
    #[error("Configuration error: {0}")]
    Config(String),
}
