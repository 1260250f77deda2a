use crate::error::{Error, Result};

/// Decides which key URIs a client serves
///
/// A bound policy accepts exactly one key URI. An unbound policy accepts every key URI that
/// starts with its scheme prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUriPolicy {
    prefix: String,
    bound: Option<String>,
}

impl KeyUriPolicy {
    /// Creates a policy accepting any key URI with the given scheme prefix
    pub fn unbound(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            bound: None,
        }
    }

    /// Creates a policy accepting only `key_uri`
    ///
    /// Fails with [`Error::MalformedUri`] if `key_uri` does not carry `prefix` or names no
    /// resource after it.
    pub fn bound(prefix: impl Into<String>, key_uri: impl Into<String>) -> Result<Self> {
        let policy = Self {
            prefix: prefix.into(),
            bound: None,
        };
        let key_uri = key_uri.into();
        policy.resource(&key_uri)?;

        Ok(Self {
            bound: Some(key_uri),
            ..policy
        })
    }

    /// Creates a bound policy for a non-empty `key_uri`, an unbound one otherwise
    pub fn from_key_uri(prefix: impl Into<String>, key_uri: &str) -> Result<Self> {
        if key_uri.is_empty() {
            Ok(Self::unbound(prefix))
        } else {
            Self::bound(prefix, key_uri)
        }
    }

    /// The scheme prefix, e.g. `gcp-kms://`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The key URI this policy is bound to, if any
    pub fn bound_key_uri(&self) -> Option<&str> {
        self.bound.as_deref()
    }

    /// Returns true if `key_uri` is accepted
    ///
    /// Bound policies compare the whole URI; there is no prefix or case folding.
    pub fn supports(&self, key_uri: &str) -> bool {
        match &self.bound {
            Some(bound) => bound == key_uri,
            None => key_uri.starts_with(&self.prefix),
        }
    }

    /// Fails with [`Error::KeyUri`] unless `key_uri` is accepted
    pub fn check(&self, key_uri: &str) -> Result<()> {
        if self.supports(key_uri) {
            return Ok(());
        }

        Err(Error::KeyUri(match &self.bound {
            Some(bound) => format!("this client is bound to {}, cannot serve {}", bound, key_uri),
            None => format!("{} does not start with {}", key_uri, self.prefix),
        }))
    }

    /// Returns the key resource named by `key_uri`, i.e. the URI without the scheme prefix
    pub fn resource<'a>(&self, key_uri: &'a str) -> Result<&'a str> {
        match key_uri.strip_prefix(self.prefix.as_str()) {
            Some(resource) if !resource.is_empty() => Ok(resource),
            Some(_) => Err(Error::MalformedUri(format!(
                "{} names no key resource",
                key_uri
            ))),
            None => Err(Error::MalformedUri(format!(
                "{} must start with {}",
                key_uri, self.prefix
            ))),
        }
    }
}
