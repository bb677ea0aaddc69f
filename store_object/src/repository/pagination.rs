//! Page-based listing with search and sorting

use super::Repository;
use crate::errors::StoreError;
use crate::query_builder::{QueryBuilder, QueryFilter, SortOrder};
use crate::traits::TableMetadata;
use serde::{Deserialize, Serialize};

/// Query parameters for a page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageParams {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring matched against the model's search fields
    pub search: Option<String>,
    /// Column to sort by; natural order when absent
    pub sort: Option<String>,
    pub order: SortOrder,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            sort: None,
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            u32::try_from((total as u64).div_ceil(u64::from(limit.max(1)))).unwrap_or(u32::MAX)
        };

        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T: TableMetadata> Repository<T> {
    /// One page of records visible in the current scope
    pub async fn paginate(&self, params: &PageParams) -> Result<Page<T>, StoreError> {
        if params.page == 0 {
            return Err(StoreError::validation(
                T::table_name(),
                "page",
                "page must be at least 1",
            ));
        }
        if params.limit == 0 {
            return Err(StoreError::validation(
                T::table_name(),
                "limit",
                "limit must be at least 1",
            ));
        }

        let mut query = QueryBuilder::new();

        if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
            let fields = T::search_fields();
            if !fields.is_empty() {
                query = query.filter(QueryFilter::or(
                    fields
                        .into_iter()
                        .map(|field| QueryFilter::contains(field, search))
                        .collect(),
                ));
            }
        }

        let total = self.count_where(query.clone()).await?;

        if let Some(sort) = &params.sort {
            if !T::columns().contains(&sort.as_str()) {
                return Err(StoreError::validation(
                    T::table_name(),
                    sort,
                    "unknown sort column",
                ));
            }
            query = query.order_by(sort, params.order);
        }

        let offset = i64::from(params.page - 1) * i64::from(params.limit);
        let items = self
            .find(query.limit(i64::from(params.limit)).offset(offset))
            .await?;

        Ok(Page {
            items,
            meta: PageMeta::new(total, params.page, params.limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.order, SortOrder::Desc);
        assert!(params.search.is_none());
        assert!(params.sort.is_none());
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: PageParams = serde_json::from_str(r#"{"page": 3, "order": "asc"}"#).unwrap();
        assert_eq!(params.page, 3);
        assert_eq!(params.limit, 10);
        assert_eq!(params.order, SortOrder::Asc);
    }

    #[test]
    fn test_meta_rounds_pages_up() {
        let meta = PageMeta::new(21, 2, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let meta = PageMeta::new(20, 2, 10);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
    }

    #[test]
    fn test_meta_empty_result() {
        let meta = PageMeta::new(0, 1, 10);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let value = serde_json::to_value(PageMeta::new(5, 1, 2)).unwrap();
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["hasNext"], true);
        assert_eq!(value["hasPrev"], false);
    }
}
