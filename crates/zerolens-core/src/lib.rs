// zerolens-core: Reactive data layer between zerolens-api and consumers.
//
// The cache module is the heart: a keyed registry of query entries with
// subscription-based delivery, per-key polling, and prefix invalidation.
// Query/mutation definitions and the join state machine sit on top of it.

pub mod cache;
pub mod engine;
pub mod error;
pub mod joining;
pub mod model;
pub mod mutations;
pub mod queries;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{QueryCache, QueryHandle, QueryKey, QueryOptions, QueryResult, QueryStatus};
pub use engine::{EngineConfig, SyncEngine};
pub use error::CoreError;
pub use joining::{
    IdentifierKind, JoinAttempt, JoinState, NETWORK_ID_TXT_KEY, ResolutionError,
    declared_name_verified, network_id_from_txt,
};
pub use model::{InvalidNetworkId, NetworkId};

// Re-export the wire types consumers handle through query results.
pub use zerolens_api::{
    ApiHealth, ManagedRoute, NetworkInfo, NetworkStatus, NetworkType, NodeStatus, PathInfo,
    PeerInfo, PeerRole,
};
