//! In-memory evaluation tests

#[cfg(test)]
mod integration_tests {
    use crate::query_builder::{QueryBuilder, QueryFilter, QueryOperator, SortOrder};
    use serde_json::{json, Value};

    fn posts() -> Vec<Value> {
        vec![
            json!({
                "id": 1,
                "title": "Hello World",
                "slug": "hello-world",
                "view_count": 10,
                "is_active": true,
                "deleted_at": null,
                "created_at": "2024-01-01T10:00:00Z"
            }),
            json!({
                "id": 2,
                "title": "Soft delete in practice",
                "slug": "soft-delete",
                "view_count": 250,
                "is_active": false,
                "deleted_at": "2024-03-01T00:00:00Z",
                "created_at": "2024-02-01T10:00:00+02:00"
            }),
            json!({
                "id": 3,
                "title": "100% coverage",
                "slug": "coverage",
                "view_count": 40,
                "is_active": true,
                "deleted_at": null,
                "created_at": "2023-12-31T23:00:00Z"
            }),
        ]
    }

    fn ids(rows: &[Value]) -> Vec<i64> {
        rows.iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    // ========================================
    // Scope-like filters
    // ========================================

    #[test]
    fn test_boolean_equality_filters_active_rows() {
        let active = QueryBuilder::new()
            .filter(QueryFilter::eq("is_active", json!(true)))
            .apply(posts());
        assert_eq!(ids(&active), vec![1, 3]);

        let deleted = QueryBuilder::new()
            .filter(QueryFilter::eq("is_active", json!(false)))
            .apply(posts());
        assert_eq!(ids(&deleted), vec![2]);
    }

    #[test]
    fn test_no_filters_keeps_insertion_order() {
        assert_eq!(ids(&QueryBuilder::new().apply(posts())), vec![1, 2, 3]);
    }

    #[test]
    fn test_null_checks() {
        let rows = QueryBuilder::new()
            .filter(QueryFilter::is_not_null("deleted_at"))
            .apply(posts());
        assert_eq!(ids(&rows), vec![2]);

        // Missing keys read as NULL
        let rows = QueryBuilder::new()
            .filter(QueryFilter::is_null("author"))
            .apply(posts());
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_null_never_compares_equal() {
        let filter = QueryFilter::condition("deleted_at", QueryOperator::Gt, Some(json!(null)));
        assert!(QueryBuilder::new().filter(filter).apply(posts()).is_empty());

        let rows = QueryBuilder::new()
            .filter(QueryFilter::ne("deleted_at", json!("2024-03-01T00:00:00Z")))
            .apply(posts());
        assert!(rows.is_empty());
    }

    // ========================================
    // Comparisons
    // ========================================

    #[test]
    fn test_numeric_range() {
        let rows = QueryBuilder::new()
            .filter(QueryFilter::gte("view_count", json!(10)))
            .filter(QueryFilter::lt("view_count", json!(250)))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1, 3]);
    }

    #[test]
    fn test_timestamps_compare_chronologically_across_offsets() {
        // 2024-02-01T10:00:00+02:00 is 08:00 UTC
        let rows = QueryBuilder::new()
            .filter(QueryFilter::lt("created_at", json!("2024-02-01T09:00:00Z")))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1, 2, 3]);

        let rows = QueryBuilder::new()
            .filter(QueryFilter::gt("created_at", json!("2024-01-01T00:00:00Z")))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1, 2]);
    }

    #[test]
    fn test_in_and_not_in() {
        let rows = QueryBuilder::new()
            .filter(QueryFilter::in_values("id", vec![json!(3), json!(1)]))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1, 3]);

        let rows = QueryBuilder::new()
            .filter(QueryFilter::in_values("id", vec![]))
            .apply(posts());
        assert!(rows.is_empty());

        let rows = QueryBuilder::new()
            .filter(QueryFilter::not_in_values("id", vec![json!(2)]))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1, 3]);
    }

    // ========================================
    // Pattern matching
    // ========================================

    #[test]
    fn test_contains_is_case_insensitive() {
        let rows = QueryBuilder::new()
            .filter(QueryFilter::contains("title", "HELLO"))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1]);
    }

    #[test]
    fn test_contains_treats_wildcards_literally() {
        let rows = QueryBuilder::new()
            .filter(QueryFilter::contains("title", "100%"))
            .apply(posts());
        assert_eq!(ids(&rows), vec![3]);

        let rows = QueryBuilder::new()
            .filter(QueryFilter::contains("slug", "_"))
            .apply(posts());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_like_wildcards() {
        let rows = QueryBuilder::new()
            .filter(QueryFilter::like("slug", "h_llo-%"))
            .apply(posts());
        assert_eq!(ids(&rows), vec![1]);

        // LIKE is case sensitive
        let rows = QueryBuilder::new()
            .filter(QueryFilter::like("title", "hello%"))
            .apply(posts());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_search_or_group() {
        let search = QueryFilter::or(vec![
            QueryFilter::contains("title", "soft"),
            QueryFilter::contains("slug", "coverage"),
        ]);
        let rows = QueryBuilder::new().filter(search).apply(posts());
        assert_eq!(ids(&rows), vec![2, 3]);
    }

    // ========================================
    // Ordering and paging
    // ========================================

    #[test]
    fn test_order_by_timestamp_desc() {
        let rows = QueryBuilder::new()
            .order_by("created_at", SortOrder::Desc)
            .apply(posts());
        assert_eq!(ids(&rows), vec![2, 1, 3]);
    }

    #[test]
    fn test_nulls_sort_last_ascending() {
        let rows = QueryBuilder::new()
            .order_by("deleted_at", SortOrder::Asc)
            .apply(posts());
        assert_eq!(ids(&rows), vec![2, 1, 3]);
    }

    #[test]
    fn test_limit_and_offset_after_ordering() {
        let rows = QueryBuilder::new()
            .order_by("view_count", SortOrder::Desc)
            .limit(1)
            .offset(1)
            .apply(posts());
        assert_eq!(ids(&rows), vec![3]);

        let rows = QueryBuilder::new().offset(10).apply(posts());
        assert!(rows.is_empty());
    }
}
