// ── Mutation definitions ──
//
// Join and leave write through to the service and, on success only,
// invalidate the entire service namespace (refetch-inactive) so every
// open network/peer/status query refreshes. Failures are returned to the
// caller; nothing is written into any query cache entry and the stale
// view persists until the user retries.

use tracing::info;

use zerolens_api::NetworkInfo;

use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::model::NetworkId;
use crate::queries::keys;

/// `POST /network/{id}` -- ask the service to join a network. The
/// identifier is supplied at call time, not at definition time.
pub async fn join_network(engine: &SyncEngine, id: &NetworkId) -> Result<NetworkInfo, CoreError> {
    let token = engine.auth_token();
    match engine.client().join_network(token.as_ref(), id.as_str()).await {
        Ok(network) => {
            info!(network = %id, "join requested");
            engine
                .cache()
                .invalidate_refetch_inactive(&keys::service());
            Ok(network)
        }
        Err(e) => Err(CoreError::MutationFailed {
            operation: format!("joining network {id}"),
            source: Box::new(e.into()),
        }),
    }
}

/// `DELETE /network/{id}` -- leave a network. A 404 (already left)
/// surfaces as a failure for the caller to render.
pub async fn leave_network(engine: &SyncEngine, id: &NetworkId) -> Result<(), CoreError> {
    let token = engine.auth_token();
    match engine
        .client()
        .leave_network(token.as_ref(), id.as_str())
        .await
    {
        Ok(()) => {
            info!(network = %id, "left network");
            engine
                .cache()
                .invalidate_refetch_inactive(&keys::service());
            Ok(())
        }
        Err(e) => Err(CoreError::MutationFailed {
            operation: format!("leaving network {id}"),
            source: Box::new(e.into()),
        }),
    }
}
