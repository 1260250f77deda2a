//! Resolution of key URIs to the KMS clients that serve them
//!
//! A [`KmsClientRegistry`] is an append-only, ordered list of clients. Applications normally
//! build one during start-up and pass it to the code that needs primitives;
//! [`KmsClientRegistry::global`] exists for code that cannot have a registry threaded through.
//!
//! # Precedence
//!
//! When several clients accept a key URI, the most specific one wins: a client bound to exactly
//! that URI is preferred over clients that accept its whole scheme. Among clients of the same
//! kind, the one registered first wins.

use crate::config::KmsConfig;
use crate::error::{Error, Result};
use crate::{Aead, KmsClient};
use std::sync::{Arc, PoisonError, RwLock};

/// Ordered set of KMS clients used to look up primitives by key URI
#[derive(Debug)]
pub struct KmsClientRegistry {
    clients: RwLock<Vec<Arc<dyn KmsClient>>>,
}

impl Default for KmsClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Process-wide registry for callers that cannot be handed one explicitly
static GLOBAL_REGISTRY: KmsClientRegistry = KmsClientRegistry::new();

impl KmsClientRegistry {
    /// Creates an empty registry
    pub const fn new() -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
        }
    }

    /// The process-wide registry, empty at start-up
    pub fn global() -> &'static KmsClientRegistry {
        &GLOBAL_REGISTRY
    }

    /// Creates a registry holding the clients described by `config`, in document order
    pub fn from_config(config: &KmsConfig) -> Result<Self> {
        let registry = Self::new();
        for client in config.build_clients()? {
            registry.register(client);
        }

        Ok(registry)
    }

    /// Appends `client`
    ///
    /// No deduplication is performed; an earlier client keeps its place.
    pub fn register(&self, client: Arc<dyn KmsClient>) {
        log::debug!(
            "registering KMS client bound to {}",
            client.bound_key_uri().unwrap_or("<any>")
        );

        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(client);
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns true if no client has been registered
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Returns the client that serves `key_uri`
    ///
    /// Fails with [`Error::NoSupportingClient`] if no registered client accepts it.
    pub fn get_client(&self, key_uri: &str) -> Result<Arc<dyn KmsClient>> {
        let clients = self.snapshot();

        let exact = clients
            .iter()
            .find(|c| c.bound_key_uri() == Some(key_uri) && c.does_support(key_uri));
        let selected = exact.or_else(|| clients.iter().find(|c| c.does_support(key_uri)));

        match selected {
            Some(client) => Ok(client.clone()),
            None => {
                log::debug!("no KMS client supports key URI {}", key_uri);
                Err(Error::NoSupportingClient(key_uri.to_string()))
            }
        }
    }

    /// Returns an AEAD primitive for `key_uri` from the client that serves it
    pub fn get_aead(&self, key_uri: &str) -> Result<Box<dyn Aead>> {
        self.get_client(key_uri)?.get_aead(key_uri)
    }

    // The lock is only held while copying the list; clients are immutable once registered
    fn snapshot(&self) -> Vec<Arc<dyn KmsClient>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
