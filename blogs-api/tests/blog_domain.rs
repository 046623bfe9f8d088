mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{app, TestApp, TestUser};

async fn create_category(app: &TestApp, user: &TestUser, name: &str) -> Value {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/categories",
            Some(&user.access_token),
            Some(json!({ "name": name })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn create_blog(app: &TestApp, user: &TestUser, title: &str, category: &str) -> String {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/blogs",
            Some(&user.access_token),
            Some(json!({ "title": title, "content": "body", "category": category })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn categories_are_upper_cased_and_unique() {
    let app = app();
    let user = app.signed_up("ada").await;

    let category = create_category(&app, &user, "rust").await;
    assert_eq!(category["name"], "RUST");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/categories",
            Some(&user.access_token),
            Some(json!({ "name": "Rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E2003");

    let (status, body) = app.send(Method::GET, "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blog_with_unknown_category_is_rejected() {
    let app = app();
    let user = app.signed_up("ada").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/blogs",
            Some(&user.access_token),
            Some(json!({ "title": "t", "content": "c", "category": "nope" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E2005");
}

#[tokio::test]
async fn blog_details_carry_names_and_likes() {
    let app = app();
    let ada = app.signed_up("ada").await;
    let bob = app.signed_up("bob").await;
    create_category(&app, &ada, "rust").await;
    let blog_id = create_blog(&app, &ada, "Ownership", "Rust").await;

    let like_uri = format!("/api/blogs/{blog_id}/like");
    let (_, body) = app.send(Method::PUT, &like_uri, Some(&bob.access_token), None).await;
    assert_eq!(body["data"]["liked"], true);

    let (status, body) = app
        .send(Method::GET, &format!("/api/blogs/{blog_id}"), Some(&bob.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["author_name"], "ada");
    assert_eq!(body["data"]["category_name"], "RUST");
    assert_eq!(body["data"]["likes"], 1);

    let (_, body) = app.send(Method::PUT, &like_uri, Some(&bob.access_token), None).await;
    assert_eq!(body["data"]["liked"], false);
}

#[tokio::test]
async fn only_the_author_may_change_a_blog() {
    let app = app();
    let ada = app.signed_up("ada").await;
    let bob = app.signed_up("bob").await;
    create_category(&app, &ada, "rust").await;
    let blog_id = create_blog(&app, &ada, "Ownership", "RUST").await;
    let uri = format!("/api/blogs/{blog_id}");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&bob.access_token), Some(json!({ "title": "mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E2011");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&bob.access_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&ada.access_token), Some(json!({ "title": "Borrowing" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Borrowing");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&ada.access_token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&ada.access_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, &uri, Some(&ada.access_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E2001");
}

#[tokio::test]
async fn bad_path_ids_are_bad_requests() {
    let app = app();
    let ada = app.signed_up("ada").await;

    let (status, body) = app
        .send(Method::GET, "/api/blogs/not-a-uuid", Some(&ada.access_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn follow_toggles_and_drives_the_feed() {
    let app = app();
    let ada = app.signed_up("ada").await;
    let bob = app.signed_up("bob").await;
    create_category(&app, &ada, "rust").await;
    create_blog(&app, &ada, "Ownership", "RUST").await;

    let follow_uri = format!("/api/users/follow/{}", ada.id);
    let (status, body) = app.send(Method::POST, &follow_uri, Some(&bob.access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["following"], true);

    let (_, body) = app
        .send(Method::GET, "/api/users/feeds", Some(&bob.access_token), None)
        .await;
    assert_eq!(body["data"][0]["title"], "Ownership");

    let (_, body) = app.send(Method::POST, &follow_uri, Some(&bob.access_token), None).await;
    assert_eq!(body["data"]["following"], false);

    let (_, body) = app
        .send(Method::GET, "/api/users/feeds", Some(&bob.access_token), None)
        .await;
    assert_eq!(body["data"], json!([]));

    let self_uri = format!("/api/users/follow/{}", bob.id);
    let (status, body) = app.send(Method::POST, &self_uri, Some(&bob.access_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E2010");
}

#[tokio::test]
async fn collections_are_private_and_reject_duplicates() {
    let app = app();
    let ada = app.signed_up("ada").await;
    let bob = app.signed_up("bob").await;
    create_category(&app, &ada, "rust").await;
    let blog_id = create_blog(&app, &ada, "Ownership", "RUST").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/collections",
            Some(&bob.access_token),
            Some(json!({ "name": "reading list" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let collection_id = body["data"]["id"].as_str().unwrap().to_string();
    let entries_uri = format!("/api/collections/{collection_id}/blogs");

    let add = json!({ "blog_id": blog_id });
    let (status, _) = app
        .send(Method::POST, &entries_uri, Some(&bob.access_token), Some(add.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(Method::POST, &entries_uri, Some(&bob.access_token), Some(add))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E2007");

    let (status, _) = app.send(Method::GET, &entries_uri, Some(&ada.access_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.send(Method::GET, &entries_uri, Some(&bob.access_token), None).await;
    assert_eq!(body["data"][0]["id"], blog_id.as_str());

    let entry_uri = format!("{entries_uri}/{blog_id}");
    let (status, _) = app.send(Method::DELETE, &entry_uri, Some(&bob.access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.send(Method::DELETE, &entry_uri, Some(&bob.access_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E2008");
}

#[tokio::test]
async fn comments_are_listed_oldest_first_with_likes() {
    let app = app();
    let ada = app.signed_up("ada").await;
    let bob = app.signed_up("bob").await;
    create_category(&app, &ada, "rust").await;
    let blog_id = create_blog(&app, &ada, "Ownership", "RUST").await;

    let mut comment_ids = Vec::new();
    for text in ["first", "second"] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/comments",
                Some(&bob.access_token),
                Some(json!({ "blog_id": blog_id, "description": text })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        comment_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (_, body) = app
        .send(
            Method::PUT,
            &format!("/api/comments/{}/like", comment_ids[0]),
            Some(&ada.access_token),
            None,
        )
        .await;
    assert_eq!(body["data"]["liked"], true);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/comments/{}", comment_ids[1]),
            Some(&ada.access_token),
            Some(json!({ "description": "edited" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E2011");

    let (_, body) = app
        .send(
            Method::GET,
            &format!("/api/blogs/{blog_id}/comments"),
            Some(&ada.access_token),
            None,
        )
        .await;
    let comments = body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["description"], "first");
    assert_eq!(comments[0]["likes"], 1);
    assert_eq!(comments[1]["likes"], 0);
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = app();
    let ada = app.signed_up("ada").await;
    let category = create_category(&app, &ada, "rust").await;
    create_blog(&app, &ada, "Ownership", "RUST").await;

    let uri = format!("/api/categories/{}", category["id"].as_str().unwrap());
    let (status, body) = app.send(Method::DELETE, &uri, Some(&ada.access_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E2004");
}

#[tokio::test]
async fn search_is_public_and_case_insensitive() {
    let app = app();
    let ada = app.signed_up("ada").await;
    app.signed_up("adalbert").await;
    create_category(&app, &ada, "rust").await;
    create_blog(&app, &ada, "Fearless Concurrency", "RUST").await;

    let (status, body) = app
        .send(Method::GET, "/api/search/users?username=ADA", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .send(Method::GET, "/api/search/users?username=ada&per_page=1", None, None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app
        .send(Method::GET, "/api/search/blogs?title=fearless", None, None)
        .await;
    assert_eq!(body["data"][0]["title"], "Fearless Concurrency");

    let (status, _) = app.send(Method::GET, "/api/search/blogs", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = app();
    app.signed_up("ada").await;

    for uri in [
        "/api/search/users?username=a&page=9223372036854775807",
        "/api/search/blogs?title=a&page=9223372036854775807&per_page=100",
    ] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        assert_eq!(body["data"], json!([]));
    }
}

#[tokio::test]
async fn profile_update_guards_email_uniqueness() {
    let app = app();
    let ada = app.signed_up("ada").await;
    app.signed_up("bob").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(&ada.access_token),
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E1002");

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(&ada.access_token),
            Some(json!({ "username": "lovelace" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "lovelace");
}
