//! In-process evaluation of filters against JSON rows
//!
//! Mirrors the SQL semantics closely enough for the memory backend: NULL never
//! compares equal, timestamps compare chronologically, LIKE supports `%`, `_`
//! and backslash escapes.

use crate::query_builder::builder::QueryBuilder;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::SortOrder;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

impl QueryFilter {
    /// Whether `row` (a JSON object) satisfies this filter
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            QueryFilter::Condition(condition) => condition.matches(row),
            QueryFilter::Group { operator, filters } => match operator {
                LogicalOperator::And => filters.iter().all(|f| f.matches(row)),
                LogicalOperator::Or => filters.iter().any(|f| f.matches(row)),
            },
        }
    }
}

impl QueryCondition {
    fn matches(&self, row: &Value) -> bool {
        let actual = row.get(&self.field).unwrap_or(&Value::Null);

        match (&self.operator, &self.value) {
            (QueryOperator::IsNull, _) => actual.is_null(),
            (QueryOperator::IsNotNull, _) => !actual.is_null(),
            (QueryOperator::Eq, None | Some(Value::Null)) => actual.is_null(),
            (QueryOperator::Ne, None | Some(Value::Null)) => !actual.is_null(),
            (QueryOperator::In, Some(Value::Array(candidates))) => candidates
                .iter()
                .any(|c| compare_values(actual, c) == Some(Ordering::Equal)),
            (QueryOperator::NotIn, Some(Value::Array(candidates))) => {
                !actual.is_null()
                    && candidates
                        .iter()
                        .all(|c| compare_values(actual, c) != Some(Ordering::Equal))
            }
            (QueryOperator::NotIn, _) => true,
            (QueryOperator::Like, Some(Value::String(pattern))) => match actual {
                Value::String(text) => like_match(text, pattern, false),
                _ => false,
            },
            (QueryOperator::ILike, Some(Value::String(pattern))) => match actual {
                Value::String(text) => like_match(text, pattern, true),
                _ => false,
            },
            (operator, Some(expected)) => {
                let ordering = compare_values(actual, expected);
                match operator {
                    QueryOperator::Eq => ordering == Some(Ordering::Equal),
                    QueryOperator::Ne => matches!(ordering, Some(o) if o != Ordering::Equal),
                    QueryOperator::Gt => ordering == Some(Ordering::Greater),
                    QueryOperator::Gte => {
                        matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
                    }
                    QueryOperator::Lt => ordering == Some(Ordering::Less),
                    QueryOperator::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                    _ => false,
                }
            }
            (_, None) => false,
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// SQL-style comparison; `None` when either side is NULL or the types differ
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        _ => None,
    }
}

fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern): (Vec<char>, Vec<char>) = if case_insensitive {
        (
            text.to_lowercase().chars().collect(),
            pattern.to_lowercase().chars().collect(),
        )
    } else {
        (text.chars().collect(), pattern.chars().collect())
    };
    like_match_from(&text, &pattern)
}

fn like_match_from(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_match_from(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_match_from(&text[1..], rest),
        Some(('\\', rest)) if !rest.is_empty() => {
            text.first() == rest.first() && like_match_from(&text[1..], &rest[1..])
        }
        Some((c, rest)) => text.first() == Some(c) && like_match_from(&text[1..], rest),
    }
}

impl QueryBuilder {
    /// Whether `row` passes every filter (ordering and paging ignored)
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Filter, order and page `rows` the way the SQL rendering of this query would
    pub fn apply(&self, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut selected: Vec<Value> = rows.into_iter().filter(|row| self.matches(row)).collect();

        if !self.order_by.is_empty() {
            // Stable sort keeps insertion order among equal keys
            selected.sort_by(|a, b| {
                for (field, order) in &self.order_by {
                    let left = a.get(field).unwrap_or(&Value::Null);
                    let right = b.get(field).unwrap_or(&Value::Null);
                    let ordering = match (left.is_null(), right.is_null()) {
                        (true, true) => Ordering::Equal,
                        // PostgreSQL sorts NULLs last ascending, first descending
                        (true, false) => Ordering::Greater,
                        (false, true) => Ordering::Less,
                        (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
                    };
                    let ordering = match order {
                        SortOrder::Asc => ordering,
                        SortOrder::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let limit = self
            .limit
            .map(|l| l.max(0) as usize)
            .unwrap_or(usize::MAX);

        selected.into_iter().skip(offset).take(limit).collect()
    }
}
