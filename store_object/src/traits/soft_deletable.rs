//! Trait definitions
//!
//! Opt-in marker for cascading soft delete.

use crate::cascade::Dependents;
use crate::traits::table_metadata::TableMetadata;

/// A model that is soft-deleted instead of removed
///
/// Implement it by hand next to the model; `dependents` lists the owned
/// relations a delete cascades through, in the order they are walked.
/// Only relations whose target also implements `SoftDelete` can be listed.
///
/// ```ignore
/// impl SoftDelete for Post {
///     fn dependents() -> Dependents<Self> {
///         Dependents::new().cascade(Post::COMMENTS)
///     }
/// }
/// ```
pub trait SoftDelete: TableMetadata {
    fn dependents() -> Dependents<Self> {
        Dependents::new()
    }
}
