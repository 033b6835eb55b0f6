pub mod config;
pub mod error;
pub mod room;
pub mod signaling;
pub mod store;

pub use config::ServerConfig;
pub use error::{RegistryError, RoomGone, StoreError};
pub use room::{DeliveryHandle, RoomHandle, RoomRegistry};
pub use signaling::{Connection, MessageRouter};
pub use store::{MemoryStore, SessionStore};

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Explicitly owned service state shared by the gateway and the HTTP
/// surface; constructed in `main` (or a test) and passed in, never a
/// process-wide global.
pub struct AppState {
    pub registry: RoomRegistry,
    pub router: MessageRouter,
}

impl AppState {
    pub fn new(registry: RoomRegistry) -> Self {
        let router = MessageRouter::new(registry.clone());
        Self { registry, router }
    }
}

/// Assemble the axum application: the WebSocket signaling endpoint plus
/// the out-of-band room API.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(signaling::ws_handler))
        .route("/api/rooms", post(signaling::create_room))
        .route("/api/rooms/{room_id}", get(signaling::room_info))
        .layer(cors)
        .with_state(state)
}
