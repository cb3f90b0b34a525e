//! HTTP API for the askdocs document Q&A service.
//!
//! The binary wires the OpenAI providers and the Qdrant store into a
//! [`QaPipeline`](askdocs_rag::pipeline::QaPipeline) and serves the
//! `/api/documents` surface. The router is exposed so tests can drive it
//! with an in-memory store and fake providers.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::app_router;
pub use state::AppState;
