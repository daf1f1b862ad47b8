//! Client secret middleware for the token endpoint
//!
//! Public clients send only their `client_id`. The gateway knows the matching
//! secret and turns the request into an HTTP Basic authenticated one before
//! it reaches the OAuth server.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::{IntoResponse, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use futures::future::BoxFuture;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::oauth::OAuthSpec;

const CLIENT_ID: &str = "client_id";

/// Largest token request body read while looking for `client_id`
const MAX_FORM_BODY: usize = 64 * 1024;

/// OAuth token error body
#[derive(Debug, Serialize)]
struct TokenErrorResponse {
    error: &'static str,
    error_description: String,
}

fn token_error(status: StatusCode, error: &'static str, description: impl Into<String>) -> Response<Body> {
    (
        status,
        Json(TokenErrorResponse {
            error,
            error_description: description.into(),
        }),
    )
        .into_response()
}

/// Tower [`Layer`](tower::Layer) that applies [`SecretService`].
#[derive(Debug, Clone)]
pub struct SecretLayer {
    spec: Arc<OAuthSpec>,
}

impl SecretLayer {
    pub fn new(spec: Arc<OAuthSpec>) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &Arc<OAuthSpec> {
        &self.spec
    }
}

impl<S> tower::Layer<S> for SecretLayer {
    type Service = SecretService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecretService {
            spec: self.spec.clone(),
            inner,
        }
    }
}

/// Tower service that injects client credentials into token requests.
#[derive(Debug, Clone)]
pub struct SecretService<S> {
    spec: Arc<OAuthSpec>,
    inner: S,
}

impl<S> tower::Service<Request<Body>> for SecretService<S>
where
    S: tower::Service<Request<Body>, Response = Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let spec = self.spec.clone();
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            if has_basic_auth(&req) {
                debug!(server = %spec.name(), "[Secret] Request already carries client credentials");
                return inner.call(req).await;
            }

            let (req, client_id) = match extract_client_id(req).await {
                Ok(found) => found,
                Err(response) => return Ok(response),
            };

            let Some(client_id) = client_id else {
                warn!(server = %spec.name(), "[Secret] Token request without client_id");
                return Ok(token_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                    "client_id is required",
                ));
            };

            let Some(secret) = spec.config().secret_for(&client_id) else {
                warn!(server = %spec.name(), client_id = %client_id, "[Secret] Unknown client");
                return Ok(token_error(
                    StatusCode::UNAUTHORIZED,
                    "invalid_client",
                    "Client not registered",
                ));
            };

            let credentials = STANDARD.encode(format!("{}:{}", client_id, secret));
            let mut req = req;
            match HeaderValue::from_str(&format!("Basic {}", credentials)) {
                Ok(value) => {
                    req.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    warn!(server = %spec.name(), client_id = %client_id, "[Secret] Client credentials are not a valid header");
                    return Ok(token_error(
                        StatusCode::UNAUTHORIZED,
                        "invalid_client",
                        "Client credentials are malformed",
                    ));
                }
            }

            debug!(server = %spec.name(), client_id = %client_id, "[Secret] Injected client credentials");
            inner.call(req).await
        })
    }
}

fn has_basic_auth<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.len() > 6 && v[..6].eq_ignore_ascii_case("basic "))
        .unwrap_or(false)
}

fn is_form<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn find_client_id(pairs: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(pairs)
        .find(|(key, _)| key == CLIENT_ID)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Look for `client_id` in the query string, then in a form body.
///
/// The body is buffered and put back so the handler still sees it.
async fn extract_client_id(
    req: Request<Body>,
) -> Result<(Request<Body>, Option<String>), Response<Body>> {
    if let Some(client_id) = req.uri().query().and_then(|q| find_client_id(q.as_bytes())) {
        return Ok((req, Some(client_id)));
    }
    if !is_form(&req) {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_FORM_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("[Secret] Failed to read token request body: {}", e);
            return Err(token_error(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "Request body could not be read",
            ));
        }
    };
    let client_id = find_client_id(&bytes);
    Ok((Request::from_parts(parts, Body::from(bytes)), client_id))
}
