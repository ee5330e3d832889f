use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Keeps a caller-supplied `X-Request-Id` or mints one, and echoes it on the response.
///
/// Must wrap the trace layer so the id is already on the request when the
/// span is created.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let existing = req
        .headers()
        .get(&REQUEST_ID)
        .filter(|v| v.to_str().is_ok_and(|s| !s.trim().is_empty()))
        .cloned();
    let id = match existing {
        Some(v) => v,
        None => {
            let value = new_request_id();
            req.headers_mut().insert(REQUEST_ID, value.clone());
            value
        }
    };

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID, id);
    res
}

fn new_request_id() -> HeaderValue {
    // hyphenated uuid text is plain ASCII
    HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap_or(HeaderValue::from_static("req-unknown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| new_request_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
