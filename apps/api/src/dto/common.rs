use serde::Serialize;

/// Liveness probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
