//! Request plumbing shared by every route: request ids, API keys on the
//! reconcile routes, and a cap on reconciliations in flight.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::api::ApiError;

const API_KEYS_VAR: &str = "AUTOPRICE_API_KEYS";
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id stored as a request extension and echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses a caller-supplied id when it is short and printable, otherwise
    /// generates a `UUIDv4`.
    fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
            .map_or_else(
                || Self(Uuid::new_v4().to_string()),
                |id| Self(id.to_owned()),
            )
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

pub async fn assign_request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let echoed = HeaderValue::from_str(&id.0).ok();
    req.extensions_mut().insert(id);

    let mut res = next.run(req).await;
    if let Some(value) = echoed {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Bearer tokens accepted on the reconcile routes. `None` leaves them open.
#[derive(Debug, Clone)]
pub struct ApiKeys(Option<Arc<[String]>>);

impl ApiKeys {
    /// Reads `AUTOPRICE_API_KEYS`.
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        Self::parse(
            &std::env::var(API_KEYS_VAR).unwrap_or_default(),
            is_development,
        )
    }

    /// Parses a comma-separated key list. An empty list leaves the routes
    /// open in development and is rejected elsewhere.
    ///
    /// # Errors
    ///
    /// Fails outside development when `raw` holds no key.
    pub fn parse(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self(Some(keys.into()))),
            (true, true) => {
                tracing::warn!("{API_KEYS_VAR} not set; reconcile routes are open");
                Ok(Self(None))
            }
            (true, false) => anyhow::bail!("{API_KEYS_VAR} is required outside development"),
        }
    }

    #[must_use]
    pub fn is_enforced(&self) -> bool {
        self.0.is_some()
    }

    fn accepts(&self, authorization: Option<&HeaderValue>) -> bool {
        let Some(keys) = &self.0 else {
            return true;
        };
        bearer_token(authorization).is_some_and(|token| keys.iter().any(|k| k == token))
    }
}

/// Token of an `Authorization: Bearer <token>` header; the scheme is
/// case-insensitive.
fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    let (scheme, token) = value?.to_str().ok()?.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub async fn require_api_key(State(keys): State<ApiKeys>, req: Request, next: Next) -> Response {
    if keys.accepts(req.headers().get(AUTHORIZATION)) {
        return next.run(req).await;
    }
    tracing::warn!(path = %req.uri().path(), "rejected request without a valid api key");
    ApiError::new(
        request_id_of(&req),
        "unauthorized",
        "missing or invalid bearer token",
    )
    .into_response()
}

/// Bounds how many reconcile requests run at once. Every request fans out
/// to both listing sites, so this is what keeps outbound traffic polite when
/// several clients call in parallel.
#[derive(Debug, Clone)]
pub struct ReconcileLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ReconcileLimiter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }
}

/// Rejects with `429 rate_limited` instead of queueing when every permit is
/// taken.
pub async fn limit_reconciliations(
    State(limiter): State<ReconcileLimiter>,
    req: Request,
    next: Next,
) -> Response {
    let Ok(_permit) = Arc::clone(&limiter.permits).try_acquire_owned() else {
        tracing::warn!(
            capacity = limiter.capacity,
            path = %req.uri().path(),
            "reconciliation capacity exhausted"
        );
        return ApiError::new(
            request_id_of(&req),
            "rate_limited",
            "too many reconciliations in progress",
        )
        .into_response();
    };
    next.run(req).await
}
