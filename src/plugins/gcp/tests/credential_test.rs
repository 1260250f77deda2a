use crate::error::Error;
use crate::plugins::gcp::{GcpCredential, CLOUD_KMS_SCOPE};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::io::Write;

const TEST_KEY_PEM: &str = include_str!("../../../../testdata/gcp_service_account_key.pem");

fn service_account_json(private_key: &str) -> String {
    json!({
        "type": "service_account",
        "project_id": "kmsaead-test",
        "private_key_id": "0123abcd",
        "private_key": private_key,
        "client_email": "kms-user@kmsaead-test.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": "https://oauth2.example.test/token"
    })
    .to_string()
}

fn authorized_user_json() -> String {
    json!({
        "type": "authorized_user",
        "client_id": "client-id.apps.googleusercontent.com",
        "client_secret": "very-secret",
        "refresh_token": "1//refresh-token"
    })
    .to_string()
}

#[test]
fn test_parse_service_account() {
    let credential = GcpCredential::from_json(&service_account_json(TEST_KEY_PEM)).unwrap();

    assert_eq!(credential.kind(), "service_account");
    assert_eq!(credential.token_uri(), "https://oauth2.example.test/token");
}

#[test]
fn test_service_account_with_bad_key_is_rejected() {
    let result = GcpCredential::from_json(&service_account_json("not a pem"));
    assert!(matches!(result, Err(Error::Credential(_))));
}

#[test]
fn test_parse_authorized_user_uses_default_token_uri() {
    let credential = GcpCredential::from_json(&authorized_user_json()).unwrap();

    assert_eq!(credential.kind(), "authorized_user");
    assert_eq!(credential.token_uri(), "https://oauth2.googleapis.com/token");
}

#[test]
fn test_unknown_credential_type_is_rejected() {
    let result = GcpCredential::from_json(r#"{"type": "external_account", "audience": "x"}"#);
    assert!(matches!(result, Err(Error::Credential(_))));

    let result = GcpCredential::from_json("not json");
    assert!(matches!(result, Err(Error::Credential(_))));
}

#[test]
fn test_missing_file_is_credential_error() {
    let result = GcpCredential::from_file("/nonexistent/kmsaead/credential.json");
    match result {
        Err(Error::Credential(msg)) => assert!(msg.contains("/nonexistent/kmsaead/credential.json")),
        other => panic!("expected credential error, got {:?}", other),
    }
}

#[test]
fn test_from_file_reads_credential() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(authorized_user_json().as_bytes()).unwrap();

    let credential = GcpCredential::from_file(file.path()).unwrap();
    assert_eq!(credential.kind(), "authorized_user");
}

#[test]
fn test_debug_redacts_secrets() {
    let credential = GcpCredential::from_json(&authorized_user_json()).unwrap();
    let debug = format!("{:?}", credential);

    assert!(debug.contains("client-id.apps.googleusercontent.com"));
    assert!(!debug.contains("very-secret"));
    assert!(!debug.contains("refresh-token"));
}

#[test]
fn test_authorized_user_token_request() {
    let credential = GcpCredential::from_json(&authorized_user_json()).unwrap();
    let form = credential.token_request(Utc::now()).unwrap();

    let fields: Vec<(&str, &str)> = form.iter().map(|(k, v)| (*k, v.as_str())).collect();
    assert!(fields.contains(&("grant_type", "refresh_token")));
    assert!(fields.contains(&("refresh_token", "1//refresh-token")));
    assert!(fields.contains(&("client_secret", "very-secret")));
}

#[test]
fn test_service_account_assertion_claims() {
    let credential = GcpCredential::from_json(&service_account_json(TEST_KEY_PEM)).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let form = credential.token_request(now).unwrap();

    assert_eq!(form[0].0, "grant_type");
    assert_eq!(form[0].1.as_str(), "urn:ietf:params:oauth:grant-type:jwt-bearer");
    assert_eq!(form[1].0, "assertion");

    let segments: Vec<&str> = form[1].1.split('.').collect();
    assert_eq!(segments.len(), 3);

    let header: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
    assert_eq!(header["alg"], "RS256");
    assert_eq!(header["kid"], "0123abcd");

    let claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[1]).unwrap()).unwrap();
    assert_eq!(claims["iss"], "kms-user@kmsaead-test.iam.gserviceaccount.com");
    assert_eq!(claims["scope"], CLOUD_KMS_SCOPE);
    assert_eq!(claims["aud"], "https://oauth2.example.test/token");
    assert_eq!(claims["iat"], now.timestamp());
    assert_eq!(claims["exp"], now.timestamp() + 3600);
}
