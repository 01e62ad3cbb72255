//! Node status query (`GET /status`), polled at a short interval while a
//! credential is present; disabled otherwise.

use zerolens_api::NodeStatus;

use super::keys;
use crate::cache::{QueryHandle, QueryOptions};
use crate::engine::SyncEngine;
use crate::error::CoreError;

pub fn subscribe(engine: &SyncEngine) -> QueryHandle<NodeStatus> {
    let client = engine.client().clone();
    let auth = engine.auth_receiver();
    engine.cache().subscribe(
        keys::node(),
        move || {
            let client = client.clone();
            let token = auth.borrow().clone();
            async move {
                client
                    .node_status(token.as_ref())
                    .await
                    .map_err(CoreError::from)
            }
        },
        QueryOptions::default()
            .poll_every(engine.config().node_refetch)
            .enabled(engine.has_auth_token()),
    )
}
