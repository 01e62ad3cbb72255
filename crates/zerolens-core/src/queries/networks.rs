//! Network queries (`GET /network`, `GET /network/{id}`).
//!
//! The list accepts an empty body (zero joined networks is a valid
//! answer); the single-network route rejects one, because the join flow
//! polls it to watch a membership attempt converge and a blank record
//! there means the credential is subtly wrong. The single-network
//! interval and retention are caller-tunable for the same reason: the
//! join UI polls faster than the steady-state view.

use std::time::Duration;

use zerolens_api::NetworkInfo;

use super::keys;
use crate::cache::{QueryHandle, QueryOptions};
use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::model::NetworkId;

pub fn list(engine: &SyncEngine) -> QueryHandle<Vec<NetworkInfo>> {
    let client = engine.client().clone();
    let auth = engine.auth_receiver();
    engine.cache().subscribe(
        keys::networks(),
        move || {
            let client = client.clone();
            let token = auth.borrow().clone();
            async move {
                client
                    .list_networks(token.as_ref())
                    .await
                    .map_err(CoreError::from)
            }
        },
        QueryOptions::default()
            .poll_every(engine.config().network_refetch)
            .enabled(engine.has_auth_token()),
    )
}

pub fn detail(engine: &SyncEngine, id: &NetworkId) -> QueryHandle<NetworkInfo> {
    detail_with(engine, id, Some(engine.config().network_refetch), None)
}

pub fn detail_with(
    engine: &SyncEngine,
    id: &NetworkId,
    refetch_interval: Option<Duration>,
    cache_time: Option<Duration>,
) -> QueryHandle<NetworkInfo> {
    let client = engine.client().clone();
    let auth = engine.auth_receiver();
    let network_id = id.clone();

    let mut options = QueryOptions::default().enabled(engine.has_auth_token());
    options.refetch_interval = refetch_interval;
    options.cache_time = cache_time;

    engine.cache().subscribe(
        keys::network(id.as_str()),
        move || {
            let client = client.clone();
            let token = auth.borrow().clone();
            let network_id = network_id.clone();
            async move {
                client
                    .network(token.as_ref(), network_id.as_str())
                    .await
                    .map_err(CoreError::from)
            }
        },
        options,
    )
}
