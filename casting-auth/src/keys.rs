//! Signing key resolution.
//!
//! The identity provider publishes its verification keys as a JWKS document.
//! [`KeyResolver`] fetches that document through a [`KeySource`], keeps the
//! parsed [`KeySet`] in a single-entry cache and hands out keys by key-id.
//!
//! ## Lifecycle
//! - The set is loaded on first use, or eagerly through [`KeyResolver::prefetch`].
//! - It lives until the configured TTL elapses, or for the whole process when
//!   no TTL is set.
//! - An unknown key-id triggers at most one forced refresh per cool-down
//!   window, which is how provider key rotation is picked up.
//! - A refresh swaps in a new `Arc<KeySet>`. Readers holding the previous
//!   `Arc` keep a complete set, and no key is ever mutated in place.

use crate::error::{AuthError, SettingsError};
use crate::settings::AuthSettings;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use log::{debug, error, info, warn};
use moka::future::Cache as MokaCache;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// A public key able to verify token signatures.
#[derive(Clone)]
pub struct SigningKey {
    key_id: String,
    algorithm: Option<Algorithm>,
    decoding_key: DecodingKey,
}

impl SigningKey {
    fn new(
        key_id: impl Into<String>,
        algorithm: Option<Algorithm>,
        decoding_key: DecodingKey,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm,
            decoding_key,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Algorithm the provider declared for this key, if any.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// An immutable set of signing keys indexed by key-id.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, Arc<SigningKey>>,
}

impl KeySet {
    fn new(keys: impl IntoIterator<Item = SigningKey>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|key| (key.key_id.clone(), Arc::new(key)))
                .collect(),
        }
    }

    /// Parses a JWKS document.
    ///
    /// Entries that cannot be used for signature verification are skipped.
    /// A document without a single usable key is rejected, so a resolver
    /// never ends up serving an empty set.
    pub fn from_jwks(document: &[u8]) -> Result<Self, AuthError> {
        let document: JwksDocument = serde_json::from_slice(document).map_err(|e| {
            error!("Signing key set document is not valid JWKS: {e}");
            AuthError::key_set_unavailable()
        })?;

        let keys: Vec<SigningKey> = document
            .keys
            .into_iter()
            .filter_map(|entry| match entry.into_signing_key() {
                Ok(key) => Some(key),
                Err(reason) => {
                    warn!("Skipping signing key set entry: {reason}");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            error!("Signing key set document contains no usable keys");
            return Err(AuthError::key_set_unavailable());
        }
        Ok(Self::new(keys))
    }

    pub fn get(&self, key_id: &str) -> Option<Arc<SigningKey>> {
        self.keys.get(key_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[cfg(test)]
    fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kty: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
}

impl JwkEntry {
    fn into_signing_key(self) -> Result<SigningKey, String> {
        let key_id = self.kid.ok_or("entry has no kid")?;
        if let Some(key_use) = self.key_use.as_deref() {
            if key_use != "sig" {
                return Err(format!("key {key_id} is not a signature key ({key_use})"));
            }
        }
        let algorithm = match self.alg.as_deref() {
            Some(name) => Some(
                Algorithm::from_str(name)
                    .map_err(|_| format!("key {key_id} declares unknown algorithm {name}"))?,
            ),
            None => None,
        };

        let decoding_key = match (self.kty.as_str(), self.n, self.e, self.x, self.y) {
            ("RSA", Some(n), Some(e), _, _) => DecodingKey::from_rsa_components(&n, &e),
            ("EC", _, _, Some(x), Some(y)) => DecodingKey::from_ec_components(&x, &y),
            (kty, ..) => return Err(format!("key {key_id} has unsupported or incomplete type {kty}")),
        }
        .map_err(|e| format!("key {key_id} has invalid components: {e}"))?;

        Ok(SigningKey::new(key_id, algorithm, decoding_key))
    }
}

/// Where signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetches the complete current key set.
    ///
    /// Every failure is reported as `KeySetUnavailable`.
    async fn fetch(&self) -> Result<KeySet, AuthError>;
}

/// Reads the key set from the provider's JWKS endpoint.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: Client,
    url: Url,
}

impl HttpKeySource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, SettingsError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, url })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self, SettingsError> {
        Self::new(settings.key_set_url.clone(), settings.key_fetch_timeout)
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<KeySet, AuthError> {
        debug!("Fetching signing keys from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch signing keys from {}: {e}", self.url);
                AuthError::key_set_unavailable()
            })?;

        if !response.status().is_success() {
            error!(
                "Signing key endpoint {} answered with status {}",
                self.url,
                response.status()
            );
            return Err(AuthError::key_set_unavailable());
        }

        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read signing keys from {}: {e}", self.url);
            AuthError::key_set_unavailable()
        })?;
        KeySet::from_jwks(&body)
    }
}

const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);
const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(2);

/// Caching, rotation-aware access to the provider's signing keys.
///
/// Cloning is cheap and all clones share the same cache.
#[derive(Clone)]
pub struct KeyResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    source: Arc<dyn KeySource>,
    cache: MokaCache<(), Arc<KeySet>>,
    fetch_timeout: Duration,
    refresh_cooldown: Duration,
    failure_backoff: Duration,
    last_forced_refresh: Mutex<Option<Instant>>,
    last_failure: Mutex<Option<Instant>>,
}

impl fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyResolver")
            .field("fetch_timeout", &self.inner.fetch_timeout)
            .field("refresh_cooldown", &self.inner.refresh_cooldown)
            .field("failure_backoff", &self.inner.failure_backoff)
            .finish_non_exhaustive()
    }
}

impl KeyResolver {
    pub fn builder(source: Arc<dyn KeySource>) -> KeyResolverBuilder {
        KeyResolverBuilder {
            source,
            cache_ttl: None,
            fetch_timeout: Duration::from_secs(5),
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
        }
    }

    /// Resolver with TTL and fetch timeout taken from the settings.
    pub fn from_settings(source: Arc<dyn KeySource>, settings: &AuthSettings) -> Self {
        Self::builder(source)
            .cache_ttl(settings.key_cache_ttl)
            .fetch_timeout(settings.key_fetch_timeout)
            .build()
    }

    /// Looks up a key by key-id.
    ///
    /// `Ok(None)` means the key set is available but does not contain the id,
    /// even after a rotation refresh.
    pub async fn resolve(&self, key_id: &str) -> Result<Option<Arc<SigningKey>>, AuthError> {
        let keys = self.key_set().await?;
        if let Some(key) = keys.get(key_id) {
            return Ok(Some(key));
        }

        let Some(previous) = self.claim_forced_refresh() else {
            debug!("Key id {key_id} unknown, refresh skipped during cool-down");
            return Ok(None);
        };

        info!("Key id {key_id} unknown, refreshing signing keys");
        match self.refresh().await {
            Ok(keys) => Ok(keys.get(key_id)),
            Err(e) => {
                // A failed refresh must not use up the cool-down window.
                self.release_forced_refresh(previous);
                Err(e)
            }
        }
    }

    /// Loads the key set ahead of the first request and returns its size.
    pub async fn prefetch(&self) -> Result<usize, AuthError> {
        self.key_set().await.map(|keys| keys.len())
    }

    #[cfg(test)]
    async fn cached_key_count(&self) -> Option<usize> {
        self.inner.cache.get(&()).await.map(|keys| keys.len())
    }

    /// Current key set, fetched if nothing valid is cached.
    ///
    /// Concurrent callers missing the cache share a single fetch.
    pub async fn key_set(&self) -> Result<Arc<KeySet>, AuthError> {
        if let Some(keys) = self.inner.cache.get(&()).await {
            return Ok(keys);
        }
        self.inner
            .cache
            .try_get_with((), self.fetch_fresh())
            .await
            .map_err(|e| (*e).clone())
    }

    /// Fetches a new key set and swaps it in, replacing any cached one.
    pub async fn refresh(&self) -> Result<Arc<KeySet>, AuthError> {
        let keys = self.fetch_fresh().await?;
        self.inner.cache.insert((), Arc::clone(&keys)).await;
        Ok(keys)
    }

    async fn fetch_fresh(&self) -> Result<Arc<KeySet>, AuthError> {
        if self.in_failure_backoff() {
            debug!("Signing key fetch skipped, previous attempt failed recently");
            return Err(AuthError::key_set_unavailable());
        }

        let fetched =
            match tokio::time::timeout(self.inner.fetch_timeout, self.inner.source.fetch()).await {
                Ok(result) => result,
                Err(_) => {
                    error!(
                        "Timed out fetching signing keys after {:?}",
                        self.inner.fetch_timeout
                    );
                    Err(AuthError::key_set_unavailable())
                }
            };

        let mut last_failure = self
            .inner
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match fetched {
            Ok(keys) if !keys.is_empty() => {
                *last_failure = None;
                info!("Loaded {} signing keys", keys.len());
                Ok(Arc::new(keys))
            }
            Ok(_) => {
                *last_failure = Some(Instant::now());
                error!("Key source returned an empty key set");
                Err(AuthError::key_set_unavailable())
            }
            Err(e) => {
                *last_failure = Some(Instant::now());
                Err(e)
            }
        }
    }

    fn in_failure_backoff(&self) -> bool {
        self.inner
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|at| at.elapsed() < self.inner.failure_backoff)
    }

    /// Starts a forced refresh unless one ran within the cool-down window.
    ///
    /// Returns the previous stamp so a failed refresh can hand it back.
    fn claim_forced_refresh(&self) -> Option<Option<Instant>> {
        let mut last = self
            .inner
            .last_forced_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.is_some_and(|at| at.elapsed() < self.inner.refresh_cooldown) {
            return None;
        }
        Some(last.replace(Instant::now()))
    }

    fn release_forced_refresh(&self, previous: Option<Instant>) {
        *self
            .inner
            .last_forced_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = previous;
    }
}

/// Configures a [`KeyResolver`].
pub struct KeyResolverBuilder {
    source: Arc<dyn KeySource>,
    cache_ttl: Option<Duration>,
    fetch_timeout: Duration,
    refresh_cooldown: Duration,
    failure_backoff: Duration,
}

impl KeyResolverBuilder {
    /// How long a fetched set is trusted; `None` keeps it until rotation.
    pub fn cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Minimum time between two refreshes forced by unknown key ids.
    pub fn refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Time after a failed fetch during which no new fetch is attempted.
    pub fn failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    pub fn build(self) -> KeyResolver {
        let mut cache = MokaCache::builder().max_capacity(1);
        if let Some(ttl) = self.cache_ttl {
            cache = cache.time_to_live(ttl);
        }
        KeyResolver {
            inner: Arc::new(ResolverInner {
                source: self.source,
                cache: cache.build(),
                fetch_timeout: self.fetch_timeout,
                refresh_cooldown: self.refresh_cooldown,
                failure_backoff: self.failure_backoff,
                last_forced_refresh: Mutex::new(None),
                last_failure: Mutex::new(None),
            }),
        }
    }
}
