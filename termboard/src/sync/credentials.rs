//! Credential lookup for mutating requests.
//!
//! The CSRF token travels as a header whose value the server issued
//! earlier as a cookie. [`CredentialProvider`] abstracts where that
//! token lives so the gateway never reads a cookie store directly; the
//! production provider is the [`CookieJar`] the gateway also uses to
//! send session cookies.

use std::collections::HashMap;
use std::sync::Arc;

use termboard_proto::wire::CSRF_COOKIE;

/// Source of the CSRF token echoed on mutating requests.
///
/// A missing token is not an error: the gateway sends the empty string
/// and lets the server decide.
pub trait CredentialProvider: Send + Sync {
    /// The current CSRF token, if one is held.
    fn csrf_token(&self) -> Option<String>;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Arc<P> {
    fn csrf_token(&self) -> Option<String> {
        (**self).csrf_token()
    }
}

/// Minimal cookie store fed from `Set-Cookie` response headers.
///
/// Holds name/value pairs only; attributes (`Path`, `Max-Age`, …) are
/// ignored, which is all a single-origin API client needs.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: parking_lot::RwLock<HashMap<String, String>>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs one `Set-Cookie` header value.
    ///
    /// Only the leading `name=value` pair is kept; malformed headers
    /// are ignored.
    pub fn store_set_cookie(&self, header: &str) {
        let Some(pair) = header.split(';').next() else {
            return;
        };
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.cookies
            .write()
            .insert(name.to_string(), value.trim().to_string());
    }

    /// Stores a cookie directly.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.write().insert(name.into(), value.into());
    }

    /// Looks up a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.read().get(name).cloned()
    }

    /// Renders the jar as a `Cookie` request header value, or `None`
    /// when the jar is empty. Pairs are sorted by name for stable
    /// output.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.read();
        if cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<String> = cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        Some(pairs.join("; "))
    }

    /// Whether the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.read().is_empty()
    }
}

impl CredentialProvider for CookieJar {
    fn csrf_token(&self) -> Option<String> {
        self.get(CSRF_COOKIE)
    }
}

/// Fixed-token provider for tests and scripted setups.
#[derive(Debug, Clone)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Provider that always returns the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Provider that never has a token, exercising the empty-header
    /// fallback.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn csrf_token(&self) -> Option<String> {
        self.0.clone()
    }
}
