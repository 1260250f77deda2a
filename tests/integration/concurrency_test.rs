// Tests to verify concurrent use of primitives and the registry

use crate::integration::common::{static_client, unbound_static_client, KEY_URI, ORIGINAL_DATA};
use futures::future::join_all;
use kmsaead::{Aead, KmsClientRegistry};
use std::sync::Arc;
use tokio::task;

const NUM_TASKS: usize = 10;
const OPERATIONS_PER_TASK: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_encrypt_decrypt_with_shared_primitive() {
    let client = static_client(KEY_URI, 7);
    let aead: Arc<dyn Aead> = Arc::from(client.get_aead(KEY_URI).unwrap());

    let tasks = (0..NUM_TASKS).map(|i| {
        let aead = aead.clone();
        task::spawn(async move {
            for j in 0..OPERATIONS_PER_TASK {
                let data = format!("{}_{}_{}", String::from_utf8_lossy(ORIGINAL_DATA), i, j);
                let aad = format!("task-{}", i);

                let ciphertext = aead
                    .encrypt(data.as_bytes(), aad.as_bytes())
                    .await
                    .expect("Failed to encrypt data");
                let decrypted = aead
                    .decrypt(&ciphertext, aad.as_bytes())
                    .await
                    .expect("Failed to decrypt data");

                assert_eq!(decrypted, data.as_bytes());
            }
        })
    });

    for result in join_all(tasks).await {
        result.expect("Task panicked");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_and_lookup() {
    let registry = Arc::new(KmsClientRegistry::new());
    registry.register(unbound_static_client(8));

    let tasks = (0..NUM_TASKS).map(|i| {
        let registry = registry.clone();
        task::spawn(async move {
            let key_uri = format!("static-kms://keys/concurrent-{}", i);
            registry.register(static_client(&key_uri, i as u8));

            let aead = registry.get_aead(&key_uri).expect("Failed to resolve key URI");
            let ciphertext = aead.encrypt(ORIGINAL_DATA, b"").await.unwrap();
            assert_eq!(aead.decrypt(&ciphertext, b"").await.unwrap(), ORIGINAL_DATA);
        })
    });

    for result in join_all(tasks).await {
        result.expect("Task panicked");
    }

    assert_eq!(registry.len(), NUM_TASKS + 1);
}
