//! Peer queries (`GET /peer`, `GET /peer/{address}`). Peer identity is
//! the 10-character node address. Polled a little more lazily than
//! networks; peer sets churn slowly.

use zerolens_api::PeerInfo;

use super::keys;
use crate::cache::{QueryHandle, QueryOptions};
use crate::engine::SyncEngine;
use crate::error::CoreError;

pub fn list(engine: &SyncEngine) -> QueryHandle<Vec<PeerInfo>> {
    let client = engine.client().clone();
    let auth = engine.auth_receiver();
    engine.cache().subscribe(
        keys::peers(),
        move || {
            let client = client.clone();
            let token = auth.borrow().clone();
            async move {
                client
                    .list_peers(token.as_ref())
                    .await
                    .map_err(CoreError::from)
            }
        },
        QueryOptions::default()
            .poll_every(engine.config().peer_refetch)
            .enabled(engine.has_auth_token()),
    )
}

pub fn detail(engine: &SyncEngine, address: &str) -> QueryHandle<PeerInfo> {
    let client = engine.client().clone();
    let auth = engine.auth_receiver();
    let address_owned = address.to_owned();
    engine.cache().subscribe(
        keys::peer(address),
        move || {
            let client = client.clone();
            let token = auth.borrow().clone();
            let address = address_owned.clone();
            async move {
                client
                    .peer(token.as_ref(), &address)
                    .await
                    .map_err(CoreError::from)
            }
        },
        QueryOptions::default()
            .poll_every(engine.config().peer_refetch)
            .enabled(engine.has_auth_token()),
    )
}
