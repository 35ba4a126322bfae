use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use super::SessionClaims;
use crate::error::AppError;
use crate::state::AppState;

/// Validated session of the caller.
pub struct AuthSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        // "Bearer <token>" or the bare token
        let token = bearer_token(raw)
            .ok_or_else(|| AppError::unauthorized("empty Authorization header"))?;

        let claims = state.credentials.validate_token(token).map_err(|e| {
            warn!(error = %e, "session token rejected");
            AppError::from(e)
        })?;
        Ok(AuthSession(claims))
    }
}

fn bearer_token(raw: &str) -> Option<&str> {
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Caller address for login bookkeeping.
pub struct ClientOrigin(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientOrigin(origin_from_headers(&parts.headers).or(peer)))
    }
}

/// `X-Real-IP` wins over the first `X-Forwarded-For` hop. Values that are
/// not an IP address are ignored.
fn origin_from_headers(headers: &HeaderMap) -> Option<String> {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let as_ip = |v: &str| v.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string());

    header_str("x-real-ip").and_then(as_ip).or_else(|| {
        header_str("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .and_then(as_ip)
    })
}
