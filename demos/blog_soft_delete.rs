//! # Blog Soft Delete Example
//!
//! Walks through the blog domain:
//! - Creating posts, comments and tags
//! - Deleting a post and watching the delete cascade to its comments
//! - Looking at deleted rows through widened scopes
//! - Hard delete as the irreversible escape hatch
//!
//! Runs against PostgreSQL when `SOFTHAUS_CONFIG` points at a config file
//! (or `./softhaus.toml` exists), otherwise entirely in memory.

use softhaus::blog::{Comment, POST_TAGS, Post, PostTag, create_post};
use softhaus::prelude::*;

async fn open() -> Result<SoftHaus, Box<dyn std::error::Error>> {
    match AppConfig::load() {
        Ok(config) => {
            let softhaus = SoftHaus::connect(&config).await?;
            softhaus.auto_migrate::<Post>(true).await?;
            softhaus.auto_migrate::<Comment>(true).await?;
            softhaus.auto_migrate::<PostTag>(true).await?;
            softhaus.migrate_join_table::<Post, PostTag>(&POST_TAGS).await?;
            println!("✅ Connected to PostgreSQL and migrated tables");
            Ok(softhaus)
        }
        Err(e) => {
            println!("ℹ️  No database configured ({}), using memory storage", e);
            Ok(SoftHaus::in_memory(SoftDeleteConfig::default()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 SoftHaus Blog Soft Delete Example");
    println!("====================================");

    let softhaus = open().await?;
    let posts = softhaus.repository::<Post>();
    let comments = softhaus.repository::<Comment>();
    let tags = softhaus.repository::<PostTag>();

    println!("\n📝 Step 1: Creating Records");
    println!("----------------------------");

    let post = create_post(
        &posts,
        Post::new("Why We Never Delete", "Rows are cheap, regret is not."),
    )
    .await?;
    let other = create_post(&posts, Post::new("Second Thoughts", "Still here.")).await?;
    let again = create_post(&posts, Post::new("Second Thoughts", "Said twice.")).await?;
    println!("✅ Created post '{}' (slug: {})", post.title, post.slug);
    println!("✅ Created post '{}' (slug: {})", other.title, other.slug);
    println!("✅ Same title again gets slug: {}", again.slug);

    for (content, author) in [
        ("Great read", Some("ann".to_string())),
        ("Disagree", None),
    ] {
        let comment = comments.create(Comment::new(post.id, content, author)).await?;
        println!("  💬 {} (anonymous: {})", comment.content, comment.is_anonymous);
    }

    let rust = tags.create(PostTag::new("rust")).await?;
    Post::TAGS.attach(&post, &rust, &tags).await?;
    println!("  🏷️  Tagged with '{}'", rust.name);

    println!("\n🗑️  Step 2: Soft Delete");
    println!("-----------------------");

    let deleted = posts.delete(post.clone()).await?;
    println!(
        "✅ Deleted '{}' at {:?}",
        deleted.title, deleted.lifecycle.deleted_at
    );
    println!("📊 Active posts: {}", posts.count().await?);
    println!("📊 Active comments: {}", comments.count().await?);
    println!("📊 Tags untouched: {}", tags.count().await?);

    println!("\n🔍 Step 3: Looking Behind the Scope");
    println!("-----------------------------------");

    for post in posts.only_deleted().list().await? {
        println!("  • deleted post: {}", post.title);
    }
    let hidden = Post::COMMENTS
        .fetch(&post, &comments.including_deleted())
        .await?;
    println!("  • {} comments kept for the record", hidden.len());

    println!("\n📄 Step 4: Paginated Listing");
    println!("----------------------------");

    let page = posts
        .paginate(&PageParams {
            search: Some("thoughts".into()),
            ..PageParams::default()
        })
        .await?;
    println!(
        "📋 {} of {} matching posts (page {}/{})",
        page.items.len(),
        page.meta.total,
        page.meta.page,
        page.meta.total_pages
    );

    println!("\n💥 Step 5: Hard Delete");
    println!("----------------------");

    let removed = posts.hard_delete(&post.id).await?;
    println!("✅ Hard deleted: {}", removed);
    println!(
        "📊 Posts including deleted: {}",
        posts.including_deleted().count().await?
    );

    println!("\n🎉 Blog Soft Delete Demo Complete!");

    Ok(())
}
