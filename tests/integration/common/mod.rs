// Fixtures shared across integration tests

use kmsaead::kms::{StaticKmsClient, StaticKmsTransport};
use kmsaead::{KeyUriPolicy, KmsClient};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const KEY_URI: &str = "static-kms://keys/orders";
pub const OTHER_KEY_URI: &str = "static-kms://keys/payments";
pub const ORIGINAL_DATA: &[u8] = b"somesupersecretstring!hjdkashfjkdashfd";
pub const ASSOCIATED_DATA: &[u8] = b"tenant=42";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Creates a client with a master key filled with `seed`
pub fn static_client(key_uri: &str, seed: u8) -> Arc<dyn KmsClient> {
    Arc::new(StaticKmsClient::with_master_key(key_uri, vec![seed; 32]).unwrap())
}

// Creates an unbound client sharing one transport
pub fn unbound_static_client(seed: u8) -> Arc<dyn KmsClient> {
    let transport = Arc::new(StaticKmsTransport::new(vec![seed; 32]).unwrap());
    Arc::new(StaticKmsClient::new(
        KeyUriPolicy::unbound("static-kms://"),
        transport,
    ))
}

pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}
