//! HTTP prediction service
//!
//! Provides `POST /predict` and `GET /health` over a model loaded once at
//! startup.

pub mod handlers;
pub mod model;
pub mod server;

pub use handlers::{ApiError, AppState, PredictRequest, PredictResponse};
pub use model::ModelHandle;
pub use server::ApiServer;
