mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use blogs_api::services::token_service::{self, AccessTokenStatus};
use common::{app, SECRET};

#[tokio::test]
async fn register_returns_profile_without_token() {
    let app = app();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ada", "email": "Ada@Example.com", "password": "pw"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert!(body["data"].get("password_hash").is_none());
    assert!(body.get("access_token").is_none());
    assert!(body["data"].get("tokens").is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = app();
    app.register("ada").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "other", "email": "ADA@example.com", "password": "pw"})),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E1002");
}

#[tokio::test]
async fn invalid_registration_is_rejected() {
    let app = app();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ada", "email": "not-an-email", "password": "pw"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_issues_a_token_pair_and_refresh_row() {
    let app = app();
    app.register("ada").await;
    let user = app.login("ada").await;

    assert_eq!(user.refresh_token.len(), 64);
    assert!(matches!(
        token_service::verify_access_token(&user.access_token, SECRET),
        AccessTokenStatus::Valid(_)
    ));
    assert_eq!(app.storage.refresh_token_count(user.id).await, 1);
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let app = app();
    app.register("ada").await;

    let (wrong_pw_status, wrong_pw) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "nope"})),
        )
        .await;
    let (unknown_status, unknown) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ghost@example.com", "password": "nope"})),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
    assert_eq!(unknown["code"], "E1001");
}

#[tokio::test]
async fn valid_token_is_served_without_reissue() {
    let app = app();
    let user = app.signed_up("ada").await;

    let (status, body) = app
        .send(Method::GET, "/api/blogs", Some(&user.access_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert!(body.get("access_token").is_none());
}

/// Register, log in, come back after the access token lapsed, then again
/// after the refresh session lapsed.
#[tokio::test]
async fn expired_access_token_is_reissued_until_refresh_expires() {
    let app = app();
    let user = app.signed_up("ada").await;

    let issued_at = Utc::now() - Duration::minutes(61);
    let stale =
        token_service::issue_access_token_at(user.id, SECRET, Duration::hours(1), issued_at).unwrap();

    let (status, body) = app.send(Method::GET, "/api/blogs", Some(&stale), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let fresh = body["access_token"].as_str().expect("reissued access token").to_string();
    assert_ne!(fresh, stale);
    assert_eq!(app.storage.refresh_token_count(user.id).await, 1);

    let (status, body) = app.send(Method::GET, "/api/blogs", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("access_token").is_none());

    app.storage
        .set_refresh_token_expiry(user.id, Utc::now() - Duration::seconds(1))
        .await;

    let (status, body) = app.send(Method::GET, "/api/blogs", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E1006");
    assert_eq!(body["error"], "please login again to continue");
}

#[tokio::test]
async fn logout_revokes_refresh_sessions() {
    let app = app();
    let user = app.signed_up("ada").await;
    app.login("ada").await;

    let (status, body) = app
        .send(Method::POST, "/api/auth/logout", Some(&user.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["revoked"], 2);

    let stale = token_service::issue_access_token_at(
        user.id,
        SECRET,
        Duration::hours(1),
        Utc::now() - Duration::hours(2),
    )
    .unwrap();
    let (status, body) = app.send(Method::GET, "/api/blogs", Some(&stale), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E1005");
}

#[tokio::test]
async fn malformed_and_forged_tokens_are_rejected() {
    let app = app();
    let user = app.signed_up("ada").await;

    let (status, body) = app.send(Method::GET, "/api/blogs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E1003");

    let forged = token_service::issue_access_token(user.id, "wrong-secret", Duration::hours(1)).unwrap();
    let (status, body) = app.send(Method::GET, "/api/blogs", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E1004");
}

#[tokio::test]
async fn deleted_user_token_is_not_found() {
    let app = app();
    let user = app.signed_up("ada").await;

    let (status, _) = app
        .send(Method::DELETE, "/api/users/account", Some(&user.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.storage.refresh_token_count(user.id).await, 0);

    let (status, body) = app
        .send(Method::GET, "/api/blogs", Some(&user.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E1007");
}

#[tokio::test]
async fn health_and_metrics() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/api/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "blogs-api");

    let (status, _) = app.send(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
