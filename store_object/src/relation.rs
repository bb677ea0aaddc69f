//! Statically declared relationships between models
//!
//! A [`Relation`] is a `const` descriptor owned by the parent type. Traversal
//! goes through a child [`Repository`], so the child repository's scope
//! decides which related records are visible.

use crate::errors::StoreError;
use crate::query_builder::{QueryBuilder, QueryFilter};
use crate::repository::Repository;
use crate::traits::TableMetadata;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// Join table of a many-to-many relation, seen from the owning side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinTable {
    pub table: &'static str,
    /// Column holding the owner's primary key
    pub owner_column: &'static str,
    /// Column holding the target's primary key
    pub target_column: &'static str,
}

impl JoinTable {
    pub const fn new(
        table: &'static str,
        owner_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            table,
            owner_column,
            target_column,
        }
    }

    /// The same join table seen from the target's side
    pub const fn reversed(&self) -> Self {
        Self {
            table: self.table,
            owner_column: self.target_column,
            target_column: self.owner_column,
        }
    }

    /// CREATE TABLE for the join table. Rows go away with either endpoint.
    pub fn create_table_sql<O: TableMetadata, T: TableMetadata>(&self) -> Result<String, StoreError> {
        let table = ValidatedTableName::new(self.table)
            .map_err(|e| StoreError::validation(self.table, "table", e.to_string()))?;
        let owner = ValidatedFieldName::new(self.owner_column)
            .map_err(|e| StoreError::validation(self.table, self.owner_column, e.to_string()))?;
        let target = ValidatedFieldName::new(self.target_column)
            .map_err(|e| StoreError::validation(self.table, self.target_column, e.to_string()))?;

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             {owner} {owner_type} NOT NULL REFERENCES {owner_table} ({owner_pk}) ON DELETE CASCADE, \
             {target} {target_type} NOT NULL REFERENCES {target_table} ({target_pk}) ON DELETE CASCADE, \
             PRIMARY KEY ({owner}, {target}))",
            owner_type = O::primary_key_sql_type(),
            owner_table = O::table_name(),
            owner_pk = O::primary_key_field(),
            target_type = T::primary_key_sql_type(),
            target_table = T::table_name(),
            target_pk = T::primary_key_field(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Column on the child pointing at the parent's primary key
    ForeignKey(&'static str),
    Join(JoinTable),
}

/// Relationship from `P` (the owning side) to `C`
pub struct Relation<P, C> {
    name: &'static str,
    cardinality: Cardinality,
    link: Link,
    _marker: PhantomData<fn() -> (P, C)>,
}

impl<P, C> Clone for Relation<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C> Copy for Relation<P, C> {}

impl<P, C> fmt::Debug for Relation<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .field("link", &self.link)
            .finish()
    }
}

impl<P, C> Relation<P, C> {
    /// `C` holds `foreign_key` referencing `P`, at most one child per parent
    pub const fn one_to_one(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            cardinality: Cardinality::OneToOne,
            link: Link::ForeignKey(foreign_key),
            _marker: PhantomData,
        }
    }

    /// `C` holds `foreign_key` referencing `P`
    pub const fn one_to_many(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            cardinality: Cardinality::OneToMany,
            link: Link::ForeignKey(foreign_key),
            _marker: PhantomData,
        }
    }

    /// `P` and `C` are linked through `join`
    pub const fn many_to_many(name: &'static str, join: JoinTable) -> Self {
        Self {
            name,
            cardinality: Cardinality::ManyToMany,
            link: Link::Join(join),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn foreign_key(&self) -> Option<&'static str> {
        match self.link {
            Link::ForeignKey(column) => Some(column),
            Link::Join(_) => None,
        }
    }

    pub fn join_table(&self) -> Option<&JoinTable> {
        match &self.link {
            Link::ForeignKey(_) => None,
            Link::Join(join) => Some(join),
        }
    }
}

impl<P: TableMetadata, C: TableMetadata> Relation<P, C> {
    /// Related records visible through `children`'s scope
    pub async fn fetch(&self, parent: &P, children: &Repository<C>) -> Result<Vec<C>, StoreError> {
        let parent_id = Repository::<P>::encode_id(&parent.extract_id())?;

        let query = match &self.link {
            Link::ForeignKey(column) => QueryBuilder::new().filter(QueryFilter::eq(column, parent_id)),
            Link::Join(join) => {
                let ids = children.backend().linked(join, &parent_id).await?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                QueryBuilder::new().filter(QueryFilter::in_values(C::primary_key_field(), ids))
            }
        };

        children.find(query).await
    }

    /// First related record visible through `children`'s scope
    pub async fn fetch_one(
        &self,
        parent: &P,
        children: &Repository<C>,
    ) -> Result<Option<C>, StoreError> {
        Ok(self.fetch(parent, children).await?.into_iter().next())
    }

    /// Link `child` to `parent`. Many-to-many only.
    pub async fn attach(
        &self,
        parent: &P,
        child: &C,
        children: &Repository<C>,
    ) -> Result<(), StoreError> {
        let join = self.require_join()?;
        let parent_id = Repository::<P>::encode_id(&parent.extract_id())?;
        let child_id = Repository::<C>::encode_id(&child.extract_id())?;

        children.backend().link(join, &parent_id, &child_id).await
    }

    /// Unlink `child` from `parent`, returning whether a link existed
    pub async fn detach(
        &self,
        parent: &P,
        child: &C,
        children: &Repository<C>,
    ) -> Result<bool, StoreError> {
        let join = self.require_join()?;
        let parent_id = Repository::<P>::encode_id(&parent.extract_id())?;
        let child_id = Repository::<C>::encode_id(&child.extract_id())?;

        children.backend().unlink(join, &parent_id, &child_id).await
    }

    fn require_join(&self) -> Result<&JoinTable, StoreError> {
        self.join_table().ok_or_else(|| {
            StoreError::validation(
                P::table_name(),
                self.name,
                "attach/detach needs a many-to-many relation",
            )
        })
    }
}
