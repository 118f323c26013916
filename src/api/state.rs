//! Application state for the HTTP server.

use crate::{config::Settings, core::auth::AuthPolicy, storage::BlobStore};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Password and session rules
    pub policy: AuthPolicy,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Uploaded files
    pub storage: BlobStore,
}

impl AppState {
    /// Builds the state from a connection and the loaded settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        let policy = AuthPolicy::from(&settings.auth);
        let storage = BlobStore::new(settings.storage.root.clone());
        Self {
            db,
            policy,
            settings: Arc::new(settings),
            storage,
        }
    }
}
