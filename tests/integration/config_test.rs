// Registries built from configuration documents

use crate::integration::common::temp_file;
use kmsaead::{Error, KmsClientRegistry, KmsConfig};
use serde_json::json;

#[cfg(all(feature = "gcp-kms", feature = "aws-kms"))]
#[test]
fn test_registry_from_config_file() {
    const GCP_KEY_URI: &str =
        "gcp-kms://projects/kmsaead-test/locations/global/keyRings/unit-test/cryptoKeys/aead-key";
    const AWS_KEY_URI: &str =
        "aws-kms://arn:aws:kms:us-east-2:235739564943:key/3ee50705-5a82-4f5b-9753-05c4f473922f";

    let gcp_credential = temp_file(
        &json!({
            "type": "authorized_user",
            "client_id": "client-id",
            "client_secret": "client-secret",
            "refresh_token": "refresh-token"
        })
        .to_string(),
    );
    let aws_credentials = temp_file(
        "[kms]\naws_access_key_id = AKIDEXAMPLE\naws_secret_access_key = secret\n",
    );
    let config_file = temp_file(
        &json!({
            "clients": [
                {
                    "provider": "gcp-kms",
                    "key_uri": GCP_KEY_URI,
                    "credential_path": gcp_credential.path(),
                    "timeout_secs": 5
                },
                {
                    "provider": "aws-kms",
                    "credential_path": aws_credentials.path(),
                    "profile": "kms",
                    "max_attempts": 2
                }
            ]
        })
        .to_string(),
    );

    let config = KmsConfig::from_file(config_file.path()).unwrap();
    let registry = KmsClientRegistry::from_config(&config).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.get_client(GCP_KEY_URI).unwrap().bound_key_uri(),
        Some(GCP_KEY_URI)
    );
    assert_eq!(registry.get_client(AWS_KEY_URI).unwrap().bound_key_uri(), None);
    assert!(registry.get_aead(AWS_KEY_URI).is_ok());

    let other_gcp_key = GCP_KEY_URI.replace("aead-key", "other-key");
    assert!(matches!(
        registry.get_aead(&other_gcp_key),
        Err(Error::NoSupportingClient(_))
    ));
}

#[cfg(feature = "gcp-kms")]
#[test]
fn test_config_with_bad_credential_fails() {
    let config = KmsConfig::from_json(
        &json!({
            "clients": [
                {"provider": "gcp-kms", "credential_path": "/nonexistent/kmsaead/credential.json"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    assert!(matches!(
        KmsClientRegistry::from_config(&config),
        Err(Error::Credential(_))
    ));
}

#[test]
fn test_empty_config_gives_empty_registry() {
    let config = KmsConfig::from_json("{}").unwrap();
    let registry = KmsClientRegistry::from_config(&config).unwrap();

    assert!(registry.is_empty());
}

#[test]
fn test_malformed_config_is_rejected() {
    let config_file = temp_file("{\"clients\": [");
    assert!(matches!(
        KmsConfig::from_file(config_file.path()),
        Err(Error::Config(_))
    ));
}
