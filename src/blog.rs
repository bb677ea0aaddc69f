//! Blog domain: posts, their comments and tags
//!
//! Deleting a post soft-deletes its comments. Tags are shared reference
//! data without a lifecycle, so a post's tags are never touched.
//!
//! A post created or saved with a blank slug gets one from its title, made
//! unique among active posts by a `-1`, `-2`, ... suffix.

use crate::api::{ViewSet, WriteHook};
use async_trait::async_trait;
use serde_json::Value;
use store_object::{
    Dependents, JoinTable, Lifecycle, QueryBuilder, QueryFilter, Relation, Repository,
    SoftDelete, StoreError,
};
use table_derive::{TableMetadata, model};
use uuid::Uuid;

/// Links posts to tags
pub const POST_TAGS: JoinTable = JoinTable::new("post_tags", "post_id", "tag_id");

#[model]
#[table(name = "posts")]
#[index(is_active, title)]
#[index(is_active, slug)]
#[index(is_active, is_public)]
#[index(is_active, created_at)]
pub struct Post {
    #[primary_key]
    pub id: Uuid,

    #[field(update, search)]
    pub title: String,

    #[field(update, search)]
    pub slug: String,

    #[field(update, search)]
    pub content: String,

    #[field(update)]
    pub view_count: i32,

    #[field(update)]
    pub is_public: bool,

    #[lifecycle]
    pub lifecycle: Lifecycle,
}

impl Post {
    pub const COMMENTS: Relation<Post, Comment> = Relation::one_to_many("comments", "post_id");
    pub const TAGS: Relation<Post, PostTag> = Relation::many_to_many("tags", POST_TAGS);

    /// New public post; the slug stays blank until [`fill_slug`] runs
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: String::new(),
            content: content.into(),
            view_count: 0,
            is_public: true,
            lifecycle: Lifecycle::default(),
        }
    }
}

impl SoftDelete for Post {
    fn dependents() -> Dependents<Self> {
        Dependents::new().cascade(Post::COMMENTS)
    }
}

#[model]
#[table(name = "tags")]
pub struct PostTag {
    #[primary_key]
    pub id: Uuid,

    #[field(update, search, unique)]
    pub name: String,
}

impl PostTag {
    pub const POSTS: Relation<PostTag, Post> = Relation::many_to_many("posts", POST_TAGS.reversed());

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[model]
#[table(name = "comments")]
#[index(is_active, post_id)]
pub struct Comment {
    #[primary_key]
    pub id: Uuid,

    #[field(readonly)]
    pub post_id: Uuid,

    #[field(update, search)]
    pub content: String,

    #[field(update)]
    pub author: Option<String>,

    #[field(update)]
    pub is_anonymous: bool,

    #[lifecycle]
    pub lifecycle: Lifecycle,
}

impl Comment {
    pub fn new(post_id: Uuid, content: impl Into<String>, author: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            content: content.into(),
            is_anonymous: author.is_none(),
            author,
            lifecycle: Lifecycle::default(),
        }
    }
}

impl SoftDelete for Comment {}

/// Lowercased words joined by `-`. Letters and digits of any script are
/// kept, as is `_`; other punctuation is dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut separator = false;

    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// First of `base`, `base-1`, `base-2`, ... that no other active post uses
pub async fn unique_slug(
    posts: &Repository<Post>,
    title: &str,
    exclude: Option<Uuid>,
) -> Result<String, StoreError> {
    let active = posts.active();
    let base = slugify(title);
    let mut slug = base.clone();
    let mut counter = 1;

    loop {
        let mut query =
            QueryBuilder::new().filter(QueryFilter::eq("slug", Value::String(slug.clone())));
        if let Some(id) = exclude {
            query = query.filter(QueryFilter::ne("id", Value::String(id.to_string())));
        }
        if active.count_where(query).await? == 0 {
            return Ok(slug);
        }

        slug = format!("{}-{}", base, counter);
        counter += 1;
    }
}

/// Give `post` a unique slug if it has none
pub async fn fill_slug(posts: &Repository<Post>, mut post: Post) -> Result<Post, StoreError> {
    if post.slug.is_empty() {
        post.slug = unique_slug(posts, &post.title, Some(post.id)).await?;
    }
    Ok(post)
}

/// [`Repository::create`] with the slug filled in
pub async fn create_post(posts: &Repository<Post>, post: Post) -> Result<Post, StoreError> {
    let post = fill_slug(posts, post).await?;
    posts.create(post).await
}

/// [`Repository::save`] with the slug filled in
pub async fn save_post(posts: &Repository<Post>, post: Post) -> Result<Post, StoreError> {
    let post = fill_slug(posts, post).await?;
    posts.save(post).await
}

/// Fills blank slugs on view set writes
#[derive(Debug, Clone, Copy, Default)]
pub struct PostSlugs;

#[async_trait]
impl WriteHook<Post> for PostSlugs {
    async fn prepare(&self, repository: &Repository<Post>, record: Post) -> Result<Post, StoreError> {
        fill_slug(repository, record).await
    }
}

/// Post handlers that fill blank slugs
pub fn post_view_set(posts: Repository<Post>) -> ViewSet<Post> {
    ViewSet::new(posts).with_hook(PostSlugs)
}
