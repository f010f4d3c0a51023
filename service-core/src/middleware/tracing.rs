use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Propagates an inbound `x-request-id` or mints a fresh one, and echoes
/// it on the response so clients can correlate log lines.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id =
        incoming_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
        let mut response = next.run(req).await;
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
        return response;
    }

    next.run(req).await
}

fn incoming_request_id(req: &Request) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use tower::util::ServiceExt;

    fn app() -> Router {
        async fn ok() -> &'static str {
            "ok"
        }
        Router::new()
            .route("/", get(ok))
            .layer(from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn mints_an_id_when_none_is_sent() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn echoes_the_caller_supplied_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "req-123"
        );
    }
}
