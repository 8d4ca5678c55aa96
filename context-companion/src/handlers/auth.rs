use crate::security::{removal_cookie, CurrentSession, SessionId};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub principal: String,
    pub session_id: SessionId,
    pub created_utc: DateTime<Utc>,
    pub idle_timeout_secs: u64,
}

fn session_info(state: &AppState, session: CurrentSession) -> SessionInfo {
    let session = session.0;
    SessionInfo {
        principal: session.principal,
        session_id: session.id,
        created_utc: session.created_utc,
        idle_timeout_secs: state.gate.sessions().idle_timeout().as_secs(),
    }
}

/// Basic credentials have already been checked by the access gate, which
/// also sets the session cookie.
pub async fn login(State(state): State<AppState>, session: CurrentSession) -> Json<SessionInfo> {
    Json(session_info(&state, session))
}

pub async fn current_session(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<SessionInfo> {
    Json(session_info(&state, session))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    state.gate.sessions().invalidate(&session.id);
    tracing::info!(principal = %session.principal, session_id = %session.id, "Session closed");

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, removal_cookie()?)],
    )
        .into_response())
}
