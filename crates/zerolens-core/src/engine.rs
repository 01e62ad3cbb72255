// ── Sync engine ──
//
// The explicitly constructed owner of the query cache, HTTP client, DNS
// resolver, and credential feed. Consumers hold a cheap clone
// (`Arc<EngineInner>`) and build subscriptions through the query
// constructors. There is no hidden global: the engine is created at
// application start and torn down with `shutdown()`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use zerolens_api::{
    ApiHealth, DnsResolver, NetworkInfo, NodeStatus, PeerInfo, SERVICE_HOST, SERVICE_PORT,
    ServiceClient, SystemResolver, TransportConfig,
};

use crate::cache::{QueryCache, QueryHandle};
use crate::error::CoreError;
use crate::joining::JoinAttempt;
use crate::model::NetworkId;
use crate::{mutations, queries};

/// Engine configuration: where the service lives and how eagerly each
/// resource kind is polled.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service_url: Url,
    pub transport: TransportConfig,
    /// Node status polling period.
    pub node_refetch: Duration,
    /// Network list / single-network default polling period.
    pub network_refetch: Duration,
    /// Peer list / single-peer polling period.
    pub peer_refetch: Duration,
    /// Credential-independent reachability probe period.
    pub probe_refetch: Duration,
    /// How long DNS answers stay fresh. They are retained for the whole
    /// session either way; this only gates background re-resolution.
    pub dns_stale: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_url: Url::parse(&format!("http://{SERVICE_HOST}:{SERVICE_PORT}"))
                .expect("default service URL is valid"),
            transport: TransportConfig::default(),
            node_refetch: Duration::from_secs(1),
            network_refetch: Duration::from_secs(1),
            peer_refetch: Duration::from_secs(2),
            probe_refetch: Duration::from_secs(1),
            dns_stale: Duration::from_secs(30),
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    client: ServiceClient,
    cache: QueryCache,
    resolver: Arc<dyn DnsResolver>,
    auth: watch::Sender<Option<SecretString>>,
}

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Owns the cache lifecycle and
/// the credential feed; exposes one constructor per resource query plus
/// the join/leave mutations.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Create an engine with an injected DNS resolver.
    pub fn new(config: EngineConfig, resolver: Arc<dyn DnsResolver>) -> Result<Self, CoreError> {
        let client = ServiceClient::with_base_url(config.service_url.clone(), &config.transport)?;
        let (auth, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                client,
                cache: QueryCache::new(),
                resolver,
                auth,
            }),
        })
    }

    /// Create an engine with the system DNS resolver.
    pub fn with_system_resolver(config: EngineConfig) -> Result<Self, CoreError> {
        Self::new(config, Arc::new(SystemResolver::new()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ServiceClient {
        &self.inner.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn resolver(&self) -> Arc<dyn DnsResolver> {
        Arc::clone(&self.inner.resolver)
    }

    /// Tear down polling and retention timers. Queries stop reloading;
    /// existing handles keep their last snapshots.
    pub fn shutdown(&self) {
        self.inner.cache.shutdown();
    }

    // ── Credential feed ──────────────────────────────────────────────

    /// The current auth token, if any.
    pub fn auth_token(&self) -> Option<SecretString> {
        self.inner.auth.borrow().clone()
    }

    pub fn has_auth_token(&self) -> bool {
        self.inner.auth.borrow().is_some()
    }

    pub(crate) fn auth_receiver(&self) -> watch::Receiver<Option<SecretString>> {
        self.inner.auth.subscribe()
    }

    /// Supply or withdraw the credential. Re-emits to watchers and marks
    /// the whole service namespace stale (refetch-inactive) so everything
    /// refreshes under the new token.
    pub fn set_auth_token(&self, token: Option<SecretString>) {
        debug!(present = token.is_some(), "auth token updated");
        self.inner.auth.send_replace(token);
        self.inner
            .cache
            .invalidate_refetch_inactive(&queries::keys::service());
    }

    // ── Resource queries ─────────────────────────────────────────────

    pub fn api_health(&self) -> QueryHandle<ApiHealth> {
        queries::health::subscribe(self)
    }

    pub fn node_status(&self) -> QueryHandle<NodeStatus> {
        queries::node::subscribe(self)
    }

    pub fn networks(&self) -> QueryHandle<Vec<NetworkInfo>> {
        queries::networks::list(self)
    }

    pub fn network(&self, id: &NetworkId) -> QueryHandle<NetworkInfo> {
        queries::networks::detail(self, id)
    }

    /// Single-network query with caller-tunable polling and retention;
    /// the join flow polls faster than the steady-state view.
    pub fn network_with(
        &self,
        id: &NetworkId,
        refetch_interval: Option<Duration>,
        cache_time: Option<Duration>,
    ) -> QueryHandle<NetworkInfo> {
        queries::networks::detail_with(self, id, refetch_interval, cache_time)
    }

    pub fn peers(&self) -> QueryHandle<Vec<PeerInfo>> {
        queries::peers::list(self)
    }

    pub fn peer(&self, address: &str) -> QueryHandle<PeerInfo> {
        queries::peers::detail(self, address)
    }

    pub fn txt_records(&self, domain: &str) -> QueryHandle<Vec<String>> {
        queries::dns::txt(self, domain)
    }

    pub fn reverse_records(&self, ip: &str) -> QueryHandle<Vec<String>> {
        queries::dns::reverse(self, ip)
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn join_network(&self, id: &NetworkId) -> Result<NetworkInfo, CoreError> {
        mutations::join_network(self, id).await
    }

    pub async fn leave_network(&self, id: &NetworkId) -> Result<(), CoreError> {
        mutations::leave_network(self, id).await
    }

    /// Mark every service-backed entry stale and refresh it.
    pub fn invalidate_service(&self) {
        self.inner
            .cache
            .invalidate_refetch_inactive(&queries::keys::service());
    }

    // ── Join flow ────────────────────────────────────────────────────

    /// Begin a fresh join attempt. Constructing a new attempt is the one
    /// and only way to reset the at-most-once join guard.
    pub fn begin_join(&self) -> JoinAttempt {
        JoinAttempt::new(self)
    }
}
