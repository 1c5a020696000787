//! Opaque authentication token
//!
//! The token is a capability credential supplied on every call. The client
//! never caches, mutates, or logs it. `Debug` and `Display` are redacted so
//! tokens cannot leak through tracing fields or error messages.

/// Opaque per-call credential
///
/// Used as the partition key for buffering: a batch never mixes tokens.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a caller-supplied token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Access the raw token value
    ///
    /// Only transports should call this, to place the credential on the
    /// wire. Never log the returned value.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check whether the token is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for AuthToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AuthToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

impl std::fmt::Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}
