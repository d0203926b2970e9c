//! Admin session auth: password login issues a database-backed session
//! token delivered as an HttpOnly cookie; the `AdminSession` extractor
//! gates every admin handler.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "admin_session";

/// Pulls the admin session token out of a Cookie header value.
pub fn session_cookie_value(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|v| !v.is_empty())
}

/// Proof of an unexpired admin session. Expired rows are deleted on sight.
pub struct AdminSession {
    pub token: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let raw = session_cookie_value(cookie_header).ok_or(AppError::Unauthorized)?;
        let token = Uuid::parse_str(raw).map_err(|_| AppError::Unauthorized)?;

        let row: Option<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT expires_at FROM admin_sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&state.db)
                .await?;

        match row {
            Some((expires_at,)) if expires_at > Utc::now() => Ok(AdminSession { token }),
            Some(_) => {
                sqlx::query("DELETE FROM admin_sessions WHERE token = $1")
                    .bind(token)
                    .execute(&state.db)
                    .await?;
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// POST /api/v1/admin/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.password != state.config.admin_password {
        return Err(AppError::Unauthorized);
    }

    let token = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(state.config.admin_session_hours);
    sqlx::query("INSERT INTO admin_sessions (token, expires_at) VALUES ($1, $2)")
        .bind(token)
        .bind(expires_at)
        .execute(&state.db)
        .await?;

    info!("Admin session opened, expires {expires_at}");

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "expires_at": expires_at })),
    ))
}

/// POST /api/v1/admin/logout
pub async fn handle_logout(
    session: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("DELETE FROM admin_sessions WHERE token = $1")
        .bind(session.token)
        .execute(&state.db)
        .await?;

    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    Ok(([(header::SET_COOKIE, cookie)], StatusCode::NO_CONTENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_single() {
        assert_eq!(
            session_cookie_value("admin_session=abc123"),
            Some("abc123")
        );
    }

    #[test]
    fn test_cookie_value_among_others() {
        assert_eq!(
            session_cookie_value("theme=dark; admin_session=tok; lang=en"),
            Some("tok")
        );
    }

    #[test]
    fn test_cookie_value_missing() {
        assert_eq!(session_cookie_value("theme=dark"), None);
    }

    #[test]
    fn test_cookie_value_empty_is_rejected() {
        assert_eq!(session_cookie_value("admin_session="), None);
    }

    #[test]
    fn test_cookie_name_must_match_exactly() {
        assert_eq!(session_cookie_value("admin_session_old=tok"), None);
    }
}
