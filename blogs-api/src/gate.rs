//! Per-request authentication with silent access-token reissue.
//!
//! A request carrying a correctly signed but expired access token is still
//! served when its user holds an unexpired refresh token; the handler then
//! returns a freshly minted access token in the response envelope.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::middleware::parse_bearer;
use blogs_shared::types::ApiResponse;

use crate::models::User;
use crate::services::token_service::{self, AccessTokenStatus};
use crate::storage::Storage;
use crate::AppState;

/// The authenticated caller of a gated handler.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    /// Set when the presented access token had expired and a new one was
    /// minted for this request.
    pub refreshed_access_token: Option<String>,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Success envelope carrying the reissued access token, if any.
    pub fn reply<T: Serialize>(&self, data: T) -> Json<ApiResponse<T>> {
        Json(ApiResponse::ok(data).with_access_token(self.refreshed_access_token.clone()))
    }
}

pub async fn authenticate(
    storage: &dyn Storage,
    secret: &str,
    access_ttl: Duration,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<Session> {
    let token = authorization
        .and_then(parse_bearer)
        .ok_or_else(|| AppError::new(ErrorCode::TokenMalformed, "access token malformed"))?;

    let (claims, expired) = match token_service::verify_access_token_at(token, secret, now) {
        AccessTokenStatus::Valid(claims) => (claims, false),
        AccessTokenStatus::Expired(claims) => (claims, true),
        AccessTokenStatus::Malformed(reason) => {
            tracing::debug!(%reason, "access token rejected");
            return Err(invalid_token());
        }
    };

    let user_id = claims.user_id().ok_or_else(invalid_token)?;
    let user = storage
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    if !expired {
        return Ok(Session {
            user,
            refreshed_access_token: None,
        });
    }

    let refresh_expiry = storage
        .refresh_token_expiry(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SessionNotFound, "please log in again"))?;

    if now > refresh_expiry {
        return Err(AppError::new(
            ErrorCode::SessionExpired,
            "please login again to continue",
        ));
    }

    let access_token = token_service::issue_access_token_at(user_id, secret, access_ttl, now)?;
    tracing::info!(user_id = %user_id, "access token reissued from refresh session");

    Ok(Session {
        user,
        refreshed_access_token: Some(access_token),
    })
}

fn invalid_token() -> AppError {
    AppError::new(ErrorCode::TokenInvalid, "invalid access token")
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        authenticate(
            state.storage.as_ref(),
            &state.config.jwt_secret,
            state.config.access_ttl(),
            authorization,
            Utc::now(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRefreshToken, NewUser};
    use crate::storage::MemoryStorage;

    const SECRET: &str = "gate-secret";

    async fn seeded() -> (MemoryStorage, User) {
        let storage = MemoryStorage::new();
        let user = storage
            .create_user(NewUser {
                id: Uuid::now_v7(),
                username: "ada".into(),
                email: "ada@example.com".into(),
                password_hash: "unused".into(),
            })
            .await
            .unwrap();
        (storage, user)
    }

    async fn add_refresh(storage: &MemoryStorage, user_id: Uuid, expires_at: DateTime<Utc>) {
        storage
            .insert_refresh_token(NewRefreshToken {
                id: Uuid::now_v7(),
                user_id,
                token_hash: token_service::hash_refresh_token(&Uuid::now_v7().to_string()),
                expires_at,
            })
            .await
            .unwrap();
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn valid_token_dispatches_without_reissue() {
        let (storage, user) = seeded().await;
        let now = Utc::now();
        let token = token_service::issue_access_token_at(user.id, SECRET, Duration::hours(1), now).unwrap();

        let session = authenticate(&storage, SECRET, Duration::hours(1), Some(bearer(&token).as_str()), now)
            .await
            .unwrap();

        assert_eq!(session.user_id(), user.id);
        assert!(session.refreshed_access_token.is_none());
    }

    #[tokio::test]
    async fn expired_token_with_live_refresh_is_reissued_once() {
        let (storage, user) = seeded().await;
        let issued = Utc::now();
        let now = issued + Duration::minutes(61);
        add_refresh(&storage, user.id, issued + Duration::days(60)).await;
        let token = token_service::issue_access_token_at(user.id, SECRET, Duration::hours(1), issued).unwrap();

        let session = authenticate(&storage, SECRET, Duration::hours(1), Some(bearer(&token).as_str()), now)
            .await
            .unwrap();

        let fresh = session.refreshed_access_token.expect("reissued token");
        assert!(matches!(
            token_service::verify_access_token_at(&fresh, SECRET, now),
            AccessTokenStatus::Valid(_)
        ));
        assert_eq!(storage.refresh_token_count(user.id).await, 1);
    }

    #[tokio::test]
    async fn expired_refresh_is_rejected() {
        let (storage, user) = seeded().await;
        let issued = Utc::now();
        add_refresh(&storage, user.id, issued + Duration::days(60)).await;
        let token = token_service::issue_access_token_at(user.id, SECRET, Duration::hours(1), issued).unwrap();

        let later = issued + Duration::days(60) + Duration::seconds(1);
        let err = authenticate(&storage, SECRET, Duration::hours(1), Some(bearer(&token).as_str()), later)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SessionExpired);
    }

    #[tokio::test]
    async fn latest_refresh_row_wins() {
        let (storage, user) = seeded().await;
        let issued = Utc::now();
        add_refresh(&storage, user.id, issued + Duration::minutes(30)).await;
        add_refresh(&storage, user.id, issued + Duration::days(60)).await;
        let token = token_service::issue_access_token_at(user.id, SECRET, Duration::hours(1), issued).unwrap();

        let session = authenticate(
            &storage,
            SECRET,
            Duration::hours(1),
            Some(bearer(&token).as_str()),
            issued + Duration::hours(2),
        )
        .await
        .unwrap();

        assert!(session.refreshed_access_token.is_some());
    }

    #[tokio::test]
    async fn missing_refresh_row_is_not_found() {
        let (storage, user) = seeded().await;
        let issued = Utc::now() - Duration::hours(2);
        let token = token_service::issue_access_token_at(user.id, SECRET, Duration::hours(1), issued).unwrap();

        let err = authenticate(&storage, SECRET, Duration::hours(1), Some(bearer(&token).as_str()), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SessionNotFound);
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_signature_stops_before_user_lookup() {
        // The subject does not exist: a lookup would answer UserNotFound.
        let storage = MemoryStorage::new();
        let token = token_service::issue_access_token(Uuid::now_v7(), "other", Duration::hours(1)).unwrap();

        let err = authenticate(&storage, SECRET, Duration::hours(1), Some(bearer(&token).as_str()), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let storage = MemoryStorage::new();
        let token = token_service::issue_access_token(Uuid::now_v7(), SECRET, Duration::hours(1)).unwrap();

        let err = authenticate(&storage, SECRET, Duration::hours(1), Some(bearer(&token).as_str()), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn header_shape_is_checked_first() {
        let storage = MemoryStorage::new();
        for header in [None, Some("Token abc"), Some("Bearer"), Some("Bearer a b")] {
            let err = authenticate(&storage, SECRET, Duration::hours(1), header, Utc::now())
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::TokenMalformed);
        }
    }
}
