//! HTTP API - axum router over the core services.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  HTTP layer (axum)                           │
//! │  - bearer session extractors + role guards   │
//! │  - JSON in/out, callable error codes         │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │  Core (crate::core)                          │
//! │  - tenant-scoped operations, audit log       │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │  SeaORM entities + SQLite                    │
//! └──────────────────────────────────────────────┘
//! ```

/// Error responses
pub mod error;
/// Caller extractors
pub mod extract;
/// Route handlers
pub mod handlers;
/// Route table and middleware
pub mod router;
/// Shared state
pub mod state;

pub use router::create_router;
pub use state::AppState;
