//! Resource handler status codes and bodies

mod common;

use chrono::TimeDelta;
use common::*;
use http::StatusCode;
use serde_json::{Map, Value, json};
use softhaus::blog::{Comment, Post, PostTag, post_view_set};
use softhaus::prelude::*;

fn changes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("changes must be an object"),
    }
}

#[tokio::test]
async fn test_create_and_retrieve() {
    let fx = fixture();
    let posts = post_view_set(fx.softhaus.repository::<Post>());
    let post = Post::new("Hello API", "body");

    let created = posts.create(post.clone()).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let body = created.body.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slug"], "hello-api");
    assert_eq!(body["data"]["is_active"], true);

    let retrieved = posts.retrieve(&post.id).await;
    assert_eq!(retrieved.status, StatusCode::OK);
    assert_eq!(retrieved.body.unwrap()["data"]["title"], "Hello API");
}

#[tokio::test]
async fn test_duplicate_create_is_conflict() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let post = Post::new("Twice", "body");

    posts.create(post.clone()).await;
    let response = posts.create(post).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body.unwrap()["error"]["errorCode"], "DUPLICATE");
}

#[tokio::test]
async fn test_destroy_answers_no_content_and_cascades() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let comments = fx.softhaus.repository::<Comment>();
    let post = fx
        .softhaus
        .repository::<Post>()
        .create(Post::new("Bye", "body"))
        .await
        .unwrap();
    comments
        .create(Comment::new(post.id, "first!", None))
        .await
        .unwrap();

    let response = posts.destroy(&post.id).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_none());
    assert_eq!(comments.count().await.unwrap(), 0);

    let http = response.into_http().unwrap();
    assert!(http.body().is_empty());
}

#[tokio::test]
async fn test_deleted_resource_is_not_found() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let post = Post::new("Short lived", "body");
    posts.create(post.clone()).await;
    posts.destroy(&post.id).await;

    for response in [
        posts.retrieve(&post.id).await,
        posts.destroy(&post.id).await,
        posts
            .update(&post.id, changes(json!({"title": "Back"})))
            .await,
    ] {
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let body = response.body.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Resource not found");
    }
}

#[tokio::test]
async fn test_update_applies_changes() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let post = Post::new("Before", "body");
    posts.create(post.clone()).await;

    let later = fx.clock.advance(TimeDelta::minutes(3));
    let response = posts
        .update(&post.id, changes(json!({"title": "After", "is_public": false})))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let stored = posts.repository().get(&post.id).await.unwrap();
    assert_eq!(stored.title, "After");
    assert!(!stored.is_public);
    assert_eq!(stored.lifecycle.updated_at, later);
    assert_eq!(stored.lifecycle.created_at, start_time());
}

#[tokio::test]
async fn test_update_validation() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let post = Post::new("Strict", "body");
    posts.create(post.clone()).await;

    let empty = posts.update(&post.id, Map::new()).await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        empty.body.unwrap()["error"]["message"],
        "body: At least one field must be provided for update"
    );

    let lifecycle = posts
        .update(&post.id, changes(json!({"is_active": false})))
        .await;
    assert_eq!(lifecycle.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(lifecycle.body.unwrap()["error"]["errorCode"], "VALIDATION_ERROR");

    let wrong_type = posts
        .update(&post.id, changes(json!({"view_count": "many"})))
        .await;
    assert_eq!(wrong_type.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_is_paginated_and_scoped() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let keep = Post::new("Keep", "body");
    let drop = Post::new("Drop", "body");
    posts.create(keep).await;
    posts.create(drop.clone()).await;
    posts.destroy(&drop.id).await;

    let response = posts.list(&PageParams::default()).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.body.unwrap();
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Keep");
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let fx = fixture();
    let posts = ViewSet::new(fx.softhaus.repository::<Post>());
    let post = Post::new("Fragile", "body");
    posts.create(post.clone()).await;
    fx.backend.fail_updates_on("posts");

    let response = posts.destroy(&post.id).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body.unwrap()["error"]["errorCode"],
        "INTERNAL_SERVER_ERROR"
    );
}

#[tokio::test]
async fn test_update_with_blank_slug_regenerates_it() {
    let fx = fixture();
    let posts = post_view_set(fx.softhaus.repository::<Post>());
    let post = Post::new("First title", "body");
    posts.create(post.clone()).await;

    let response = posts
        .update(&post.id, changes(json!({"title": "Second title", "slug": ""})))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.unwrap()["data"]["slug"], "second-title");

    // A slug given explicitly is kept as is
    let response = posts
        .update(&post.id, changes(json!({"title": "Third title"})))
        .await;
    assert_eq!(response.body.unwrap()["data"]["slug"], "second-title");
}

#[tokio::test]
async fn test_duplicate_tag_name_is_conflict() {
    let fx = fixture();
    let tags = ViewSet::new(fx.softhaus.repository::<PostTag>());

    assert_eq!(tags.create(PostTag::new("rust")).await.status, StatusCode::CREATED);
    let response = tags.create(PostTag::new("rust")).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body.unwrap()["error"]["errorCode"], "DUPLICATE");
}
