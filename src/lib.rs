//! # Stowage
//!
//! Per-principal storage quotas for a code forge, usable both as a
//! standalone server and as a library.
//!
//! Administrators define named rules (a byte limit over one or more size
//! subjects), bundle them into groups, and map users or organizations onto
//! groups. Every write is classified to a subject and checked against the
//! rules that cover it.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! stowage = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{Router, middleware, routing::post};
//! use stowage::config::QuotaConfig;
//! use stowage::server::{AppState, enforce_quota};
//! use stowage::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/stowage.db").unwrap();
//! store.initialize().unwrap();
//!
//! let quota = QuotaConfig { enabled: true, default_groups: vec!["free-tier".into()] };
//! let state = Arc::new(AppState::new(Arc::new(store), quota));
//!
//! // Routing layers insert a `QuotaTarget` extension before the gate runs.
//! let forge: Router<Arc<AppState>> = Router::new()
//!     .route("/repos/{id}/releases/{rid}/assets", post(upload_asset))
//!     .layer(middleware::from_fn_with_state(state.clone(), enforce_quota));
//! ```
//!
//! Without HTTP, [`quota::gate::enforce`] answers the same question directly.
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `stowage` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod quota;
pub mod server;
pub mod store;
pub mod types;
