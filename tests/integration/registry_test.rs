// Resolution of key URIs through a registry and the primitives it hands out

use crate::integration::common::{
    init_logging, static_client, unbound_static_client, ASSOCIATED_DATA, KEY_URI, ORIGINAL_DATA,
    OTHER_KEY_URI,
};
use kmsaead::{Error, KmsClientRegistry};

#[tokio::test]
async fn test_round_trip_through_registry() {
    init_logging();

    let registry = KmsClientRegistry::new();
    registry.register(static_client(KEY_URI, 1));

    let aead = registry.get_aead(KEY_URI).unwrap();
    let ciphertext = aead.encrypt(ORIGINAL_DATA, ASSOCIATED_DATA).await.unwrap();

    assert_ne!(ciphertext.as_slice(), ORIGINAL_DATA);
    assert_eq!(
        aead.decrypt(&ciphertext, ASSOCIATED_DATA).await.unwrap(),
        ORIGINAL_DATA
    );
}

#[tokio::test]
async fn test_primitives_for_same_key_interoperate() {
    let registry = KmsClientRegistry::new();
    registry.register(static_client(KEY_URI, 1));

    let first = registry.get_aead(KEY_URI).unwrap();
    let second = registry.get_aead(KEY_URI).unwrap();

    let ciphertext = first.encrypt(ORIGINAL_DATA, b"").await.unwrap();
    assert_eq!(second.decrypt(&ciphertext, b"").await.unwrap(), ORIGINAL_DATA);
}

#[tokio::test]
async fn test_ciphertext_is_bound_to_key() {
    let registry = KmsClientRegistry::new();
    registry.register(unbound_static_client(2));

    let orders = registry.get_aead(KEY_URI).unwrap();
    let payments = registry.get_aead(OTHER_KEY_URI).unwrap();

    let ciphertext = orders.encrypt(ORIGINAL_DATA, ASSOCIATED_DATA).await.unwrap();
    assert!(matches!(
        payments.decrypt(&ciphertext, ASSOCIATED_DATA).await,
        Err(Error::Decryption(_))
    ));
}

#[tokio::test]
async fn test_bound_client_wins_over_earlier_unbound_client() {
    let registry = KmsClientRegistry::new();
    registry.register(unbound_static_client(3));
    registry.register(static_client(KEY_URI, 4));

    // Only the bound client's master key can open this ciphertext
    let bound = static_client(KEY_URI, 4).get_aead(KEY_URI).unwrap();
    let ciphertext = bound.encrypt(ORIGINAL_DATA, b"").await.unwrap();

    let resolved = registry.get_aead(KEY_URI).unwrap();
    assert_eq!(resolved.decrypt(&ciphertext, b"").await.unwrap(), ORIGINAL_DATA);

    // Any other key of the scheme falls through to the unbound client
    assert!(registry.get_aead(OTHER_KEY_URI).is_ok());
}

#[test]
fn test_unknown_scheme_has_no_supporting_client() {
    let registry = KmsClientRegistry::new();
    registry.register(unbound_static_client(5));

    match registry.get_aead("hcvault://transit/keys/orders") {
        Err(Error::NoSupportingClient(uri)) => assert_eq!(uri, "hcvault://transit/keys/orders"),
        other => panic!("expected NoSupportingClient, got {:?}", other),
    }
}

#[tokio::test]
async fn test_global_registry() {
    const GLOBAL_KEY_URI: &str = "static-kms://keys/global-registry-test";

    KmsClientRegistry::global().register(static_client(GLOBAL_KEY_URI, 6));

    let aead = KmsClientRegistry::global().get_aead(GLOBAL_KEY_URI).unwrap();
    let ciphertext = aead.encrypt(ORIGINAL_DATA, b"").await.unwrap();
    assert_eq!(aead.decrypt(&ciphertext, b"").await.unwrap(), ORIGINAL_DATA);
}
