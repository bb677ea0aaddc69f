//! Relationship traversal and join table maintenance

mod common;

use common::*;
use softhaus::blog::{Comment, Post, PostTag};
use softhaus::prelude::*;

#[tokio::test]
async fn test_attach_and_detach_tags() {
    let fx = fixture();
    let posts = fx.softhaus.repository::<Post>();
    let tags = fx.softhaus.repository::<PostTag>();

    let post = posts.create(Post::new("Tagged", "body")).await.unwrap();
    let rust = tags.create(PostTag::new("rust")).await.unwrap();
    let sql = tags.create(PostTag::new("sql")).await.unwrap();

    Post::TAGS.attach(&post, &rust, &tags).await.unwrap();
    Post::TAGS.attach(&post, &sql, &tags).await.unwrap();
    // Linking twice is harmless
    Post::TAGS.attach(&post, &rust, &tags).await.unwrap();

    let mut names: Vec<String> = Post::TAGS
        .fetch(&post, &tags)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["rust", "sql"]);

    assert!(Post::TAGS.detach(&post, &sql, &tags).await.unwrap());
    assert!(!Post::TAGS.detach(&post, &sql, &tags).await.unwrap());
    assert_eq!(Post::TAGS.fetch(&post, &tags).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reverse_many_to_many_is_scoped() {
    let fx = fixture();
    let posts = fx.softhaus.repository::<Post>();
    let tags = fx.softhaus.repository::<PostTag>();

    let rust = tags.create(PostTag::new("rust")).await.unwrap();
    let live = posts.create(Post::new("Live", "body")).await.unwrap();
    let gone = posts.create(Post::new("Gone", "body")).await.unwrap();
    Post::TAGS.attach(&live, &rust, &tags).await.unwrap();
    Post::TAGS.attach(&gone, &rust, &tags).await.unwrap();
    posts.delete(gone).await.unwrap();

    let tagged = PostTag::POSTS.fetch(&rust, &posts).await.unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, live.id);

    let all = PostTag::POSTS
        .fetch(&rust, &posts.including_deleted())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_one_to_one_fetch() {
    let fx = fixture();
    let authors = fx.softhaus.repository::<Author>();
    let profiles = fx.softhaus.repository::<Profile>();

    let author = authors.create(Author::new("Ann")).await.unwrap();
    assert!(Author::PROFILE.fetch_one(&author, &profiles).await.unwrap().is_none());

    let profile = profiles.create(Profile::new(&author, "Poet")).await.unwrap();
    let found = Author::PROFILE.fetch_one(&author, &profiles).await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(profile.id));
}

#[tokio::test]
async fn test_attach_needs_join_table() {
    let fx = fixture();
    let posts = fx.softhaus.repository::<Post>();
    let comments = fx.softhaus.repository::<Comment>();

    let post = posts.create(Post::new("Plain", "body")).await.unwrap();
    let comment = comments
        .create(Comment::new(post.id, "hi", None))
        .await
        .unwrap();

    let err = Post::COMMENTS
        .attach(&post, &comment, &comments)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation { .. }));
}

#[test]
fn test_relation_descriptors() {
    assert_eq!(Post::COMMENTS.cardinality(), Cardinality::OneToMany);
    assert_eq!(Post::COMMENTS.foreign_key(), Some("post_id"));
    assert_eq!(Author::PROFILE.cardinality(), Cardinality::OneToOne);

    let join = PostTag::POSTS.join_table().unwrap();
    assert_eq!(join.owner_column, "tag_id");
    assert_eq!(join.target_column, "post_id");
    assert_eq!(join.reversed(), softhaus::blog::POST_TAGS);
}

#[test]
fn test_join_table_ddl() {
    let sql = softhaus::blog::POST_TAGS
        .create_table_sql::<Post, PostTag>()
        .unwrap();
    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS post_tags ("));
    assert!(sql.contains("post_id UUID NOT NULL REFERENCES posts (id) ON DELETE CASCADE"));
    assert!(sql.contains("tag_id UUID NOT NULL REFERENCES tags (id) ON DELETE CASCADE"));
    assert!(sql.ends_with("PRIMARY KEY (post_id, tag_id))"));
}
