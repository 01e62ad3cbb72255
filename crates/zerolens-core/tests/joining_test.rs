// End-to-end join-flow scenarios: identifier resolution through a canned
// DNS resolver, membership pre-check and join mutation against wiremock.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zerolens_api::DnsResolver;
use zerolens_core::{
    EngineConfig, IdentifierKind, JoinState, NetworkId, ResolutionError, SyncEngine,
};

const NET_ID: &str = "1c33c1ced015c144";

// ── Canned resolver ─────────────────────────────────────────────────

#[derive(Default)]
struct CannedResolver {
    /// domain -> Ok(records) or Err(message)
    txt: HashMap<String, Result<Vec<String>, String>>,
}

impl CannedResolver {
    fn with_txt(domain: &str, records: &[String]) -> Self {
        let mut resolver = Self::default();
        resolver
            .txt
            .insert(domain.to_owned(), Ok(records.to_vec()));
        resolver
    }

    fn failing(domain: &str, message: &str) -> Self {
        let mut resolver = Self::default();
        resolver
            .txt
            .insert(domain.to_owned(), Err(message.to_owned()));
        resolver
    }
}

impl DnsResolver for CannedResolver {
    fn resolve_txt(&self, domain: &str) -> BoxFuture<'static, Result<Vec<String>, zerolens_api::Error>> {
        let answer = self.txt.get(domain).cloned();
        let name = domain.to_owned();
        Box::pin(async move {
            match answer {
                Some(Ok(records)) => Ok(records),
                Some(Err(message)) => Err(zerolens_api::Error::Dns { name, message }),
                None => Ok(Vec::new()),
            }
        })
    }

    fn resolve_reverse(&self, _ip: IpAddr) -> BoxFuture<'static, Result<Vec<String>, zerolens_api::Error>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn test_engine(uri: &str, resolver: CannedResolver) -> SyncEngine {
    let slow = Duration::from_secs(3600);
    let config = EngineConfig {
        service_url: Url::parse(uri).unwrap(),
        node_refetch: slow,
        network_refetch: slow,
        peer_refetch: slow,
        probe_refetch: slow,
        ..EngineConfig::default()
    };
    let engine = SyncEngine::new(config, Arc::new(resolver)).unwrap();
    engine.set_auth_token(Some(SecretString::from("d0c0ffee00secret")));
    engine
}

fn network_body(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "mac": "aa:bb:cc:dd:ee:ff",
        "name": "my-net",
        "status": status,
        "type": "PRIVATE",
        "mtu": 2800,
        "dhcp": false,
        "bridge": false,
        "broadcastEnabled": true,
        "portError": 0,
        "netconfRevision": 3,
        "assignedAddresses": [],
        "routes": [],
        "portDeviceName": "zt0",
        "allowManaged": true,
        "allowGlobal": false,
        "allowDefault": false,
        "allowDNS": false
    })
}

/// Mocks for a network this device has not joined yet: the membership
/// pre-check 404s, the join POST succeeds.
async fn mock_unjoined_network(server: &MockServer, id: &str, expected_joins: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/network/{id}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/network/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(network_body(id, "REQUESTING_CONFIGURATION")),
        )
        .expect(expected_joins)
        .mount(server)
        .await;
}

// ── Scenario C: one published TXT record ────────────────────────────

#[tokio::test]
async fn domain_with_unique_txt_record_resolves_and_joins() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 1).await;

    let resolver =
        CannedResolver::with_txt("example.com", &[format!("zerotier-net-id={NET_ID}")]);
    let engine = test_engine(&server.uri(), resolver);

    let attempt = engine.begin_join();
    let final_state = attempt
        .submit("example.com", IdentifierKind::DomainName)
        .await;

    let JoinState::Joined { id } = final_state else {
        panic!("expected Joined, got {final_state:?}");
    };
    assert_eq!(id.as_str(), NET_ID);
    server.verify().await;
}

#[tokio::test]
async fn url_identifiers_are_normalized_to_hostnames() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 1).await;

    let resolver =
        CannedResolver::with_txt("example.com", &[format!("zerotier-net-id={NET_ID}")]);
    let engine = test_engine(&server.uri(), resolver);

    let attempt = engine.begin_join();
    let final_state = attempt
        .submit("https://example.com/join", IdentifierKind::DomainName)
        .await;

    assert!(matches!(final_state, JoinState::Joined { .. }));
    server.verify().await;
}

// ── Scenario D: ambiguous TXT records ───────────────────────────────

#[tokio::test]
async fn ambiguous_txt_records_never_reach_the_join_mutation() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 0).await;

    let resolver = CannedResolver::with_txt(
        "example.com",
        &[
            format!("zerotier-net-id={NET_ID}"),
            "zerotier-net-id=8056c2e21c000001".to_owned(),
        ],
    );
    let engine = test_engine(&server.uri(), resolver);

    let attempt = engine.begin_join();
    let final_state = attempt
        .submit("example.com", IdentifierKind::DomainName)
        .await;

    let JoinState::ResolutionFailed { error } = final_state else {
        panic!("expected ResolutionFailed, got {final_state:?}");
    };
    assert_eq!(error, ResolutionError::Ambiguous { count: 2 });
    server.verify().await;
}

// ── Raw network IDs ─────────────────────────────────────────────────

#[tokio::test]
async fn raw_network_id_joins_without_resolution() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 1).await;

    let engine = test_engine(&server.uri(), CannedResolver::default());
    let attempt = engine.begin_join();
    let final_state = attempt.submit(NET_ID, IdentifierKind::NetworkId).await;

    assert!(matches!(final_state, JoinState::Joined { .. }));
    server.verify().await;
}

#[tokio::test]
async fn malformed_raw_id_fails_validation_without_any_request() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 0).await;

    let engine = test_engine(&server.uri(), CannedResolver::default());
    let attempt = engine.begin_join();
    let final_state = attempt
        .submit("definitely-not-hex", IdentifierKind::NetworkId)
        .await;

    assert!(matches!(
        final_state,
        JoinState::ResolutionFailed {
            error: ResolutionError::Invalid(_)
        }
    ));
    server.verify().await;
}

#[tokio::test]
async fn invalid_domain_fails_before_lookup() {
    let server = MockServer::start().await;
    let engine = test_engine(&server.uri(), CannedResolver::default());

    let attempt = engine.begin_join();
    let final_state = attempt
        .submit("not a hostname", IdentifierKind::DomainName)
        .await;

    assert!(matches!(
        final_state,
        JoinState::ResolutionFailed {
            error: ResolutionError::InvalidDomain { .. }
        }
    ));
}

#[tokio::test]
async fn lookup_failure_is_reported_distinctly() {
    let server = MockServer::start().await;
    let engine = test_engine(
        &server.uri(),
        CannedResolver::failing("example.com", "SERVFAIL"),
    );

    let attempt = engine.begin_join();
    let final_state = attempt
        .submit("example.com", IdentifierKind::DomainName)
        .await;

    assert!(matches!(
        final_state,
        JoinState::ResolutionFailed {
            error: ResolutionError::Lookup { .. }
        }
    ));
}

// ── Membership pre-check and the at-most-once guard ─────────────────

#[tokio::test]
async fn existing_membership_skips_the_mutation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/network/{NET_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(network_body(NET_ID, "OK")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/network/{NET_ID}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(network_body(NET_ID, "REQUESTING_CONFIGURATION")),
        )
        .expect(0)
        .mount(&server)
        .await;

    let engine = test_engine(&server.uri(), CannedResolver::default());
    let attempt = engine.begin_join();
    let final_state = attempt.submit(NET_ID, IdentifierKind::NetworkId).await;

    assert!(matches!(final_state, JoinState::AlreadyJoined { .. }));
    server.verify().await;
}

#[tokio::test]
async fn join_fires_at_most_once_per_attempt_instance() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 1).await;

    let engine = test_engine(&server.uri(), CannedResolver::default());
    let attempt = engine.begin_join();

    let first = attempt.submit(NET_ID, IdentifierKind::NetworkId).await;
    assert!(matches!(first, JoinState::Joined { .. }));

    // Re-submitting the same attempt instance must not re-fire the join.
    let _second = attempt.submit(NET_ID, IdentifierKind::NetworkId).await;
    server.verify().await;
}

#[tokio::test]
async fn a_fresh_attempt_resets_the_guard() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 2).await;

    let engine = test_engine(&server.uri(), CannedResolver::default());

    let first = engine.begin_join();
    assert!(matches!(
        first.submit(NET_ID, IdentifierKind::NetworkId).await,
        JoinState::Joined { .. }
    ));

    let second = engine.begin_join();
    assert_ne!(first.attempt_id(), second.attempt_id());
    assert!(matches!(
        second.submit(NET_ID, IdentifierKind::NetworkId).await,
        JoinState::Joined { .. }
    ));
    server.verify().await;
}

#[tokio::test]
async fn join_mutation_failure_surfaces_as_join_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/network/{NET_ID}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/network/{NET_ID}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = test_engine(&server.uri(), CannedResolver::default());
    let attempt = engine.begin_join();
    let final_state = attempt.submit(NET_ID, IdentifierKind::NetworkId).await;

    let JoinState::JoinFailed { id, error } = final_state else {
        panic!("expected JoinFailed, got {final_state:?}");
    };
    assert_eq!(id.as_str(), NET_ID);
    assert!(matches!(
        &*error,
        zerolens_core::CoreError::MutationFailed { .. }
    ));
}

#[tokio::test]
async fn transitions_are_observable_while_the_attempt_runs() {
    let server = MockServer::start().await;
    mock_unjoined_network(&server, NET_ID, 1).await;

    let resolver =
        CannedResolver::with_txt("example.com", &[format!("zerotier-net-id={NET_ID}")]);
    let engine = test_engine(&server.uri(), resolver);

    let attempt = engine.begin_join();
    let mut rx = attempt.watch();
    assert!(matches!(*rx.borrow(), JoinState::Idle));

    let final_state = attempt
        .submit("example.com", IdentifierKind::DomainName)
        .await;
    assert!(matches!(final_state, JoinState::Joined { .. }));

    // The watch channel converges on the terminal state.
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_terminal());
    assert!(attempt.current().is_terminal());
}
