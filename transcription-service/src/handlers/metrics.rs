use axum::response::IntoResponse;

use crate::services::metrics::get_metrics;

pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}
