use super::{Access, AccessGate, Credentials, Decision, Session};
use crate::error::GatewayError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use service_core::error::AppError;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "SESSION";

/// Applies the access gate before any handler runs.
pub async fn access_control_middleware(
    State(gate): State<Arc<AccessGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = Credentials::from_headers(req.headers());

    match gate.evaluate(req.uri().path(), &credentials) {
        Decision::Reject(reason) => {
            metrics::counter!("access_denied_total", "reason" => reason).increment(1);
            tracing::debug!(path = %req.uri().path(), reason, "Request rejected");
            Err(GatewayError::Authentication(reason.to_string()).into())
        }
        Decision::Permit(Access::Anonymous) => Ok(next.run(req).await),
        Decision::Permit(Access::Authenticated { session, issued }) => {
            let cookie = issued.then(|| session_cookie(&session));
            req.extensions_mut().insert(CurrentSession(session));

            let mut response = next.run(req).await;
            if let Some(cookie) = cookie {
                response.headers_mut().append(header::SET_COOKIE, cookie?);
            }
            Ok(response)
        }
    }
}

fn session_cookie(session: &Session) -> Result<HeaderValue, AppError> {
    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();

    HeaderValue::from_str(&cookie.to_string()).map_err(|e| AppError::InternalError(e.into()))
}

/// `Set-Cookie` value that clears the session cookie.
pub fn removal_cookie() -> Result<HeaderValue, AppError> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();
    cookie.make_removal();

    HeaderValue::from_str(&cookie.to_string()).map_err(|e| AppError::InternalError(e.into()))
}

/// The session the access gate attached to this request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| {
                GatewayError::Authentication("no session on request".to_string()).into()
            })
    }
}
