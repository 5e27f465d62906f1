//! Heartwise service - model inference over HTTP
//!
//! `POST /predict` scores one patient record, `GET /metrics` exposes the
//! request counter in Prometheus text format and `GET /` is a health probe.

pub mod errors;
pub mod inference;
pub mod server;

pub use errors::{Result, ServiceError};
pub use inference::{InferenceService, ModelSource};
pub use server::{build_router, cors_layer, start_server, AppState, HEALTH_MESSAGE};
