//! Credential-independent reachability probe query.
//!
//! Polls frequently regardless of credential state: it is the health
//! check that distinguishes "service down" from "credential problem".
//! The probe never errors -- unreachability is a resolved value.

use zerolens_api::ApiHealth;

use super::keys;
use crate::cache::{QueryHandle, QueryOptions};
use crate::engine::SyncEngine;

pub fn subscribe(engine: &SyncEngine) -> QueryHandle<ApiHealth> {
    let client = engine.client().clone();
    engine.cache().subscribe(
        keys::api(),
        move || {
            let client = client.clone();
            async move { Ok(client.probe().await) }
        },
        QueryOptions::default().poll_every(engine.config().probe_refetch),
    )
}
