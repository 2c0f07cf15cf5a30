// VizPilot - turns uploaded business files into dashboard widget specifications

pub mod config;
pub mod types;
pub mod models;
pub mod dataset;
pub mod parsers;
pub mod profiler;
pub mod agents;
pub mod widgets;
pub mod pipeline;
pub mod llm;
pub mod storage;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use pipeline::{Pipeline, UploadRequest};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
