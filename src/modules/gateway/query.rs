//! Table query descriptions shared by every gateway backend.

use serde::{Deserialize, Serialize};

/// Equality filter on one column (`column = value`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }
}

/// Result ordering on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A `select` against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: String,
    /// Comma separated column list, `*` for every column
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl SelectQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    /// PostgREST query-string pairs for this select
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(filter_pairs(&self.filters));
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push((
                "order".to_string(),
                format!("{}.{}", order.column, direction),
            ));
        }
        pairs
    }
}

/// PostgREST query-string pairs for a filter list (`column=eq.value`)
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_query_pairs() {
        let query = SelectQuery::from("complaints")
            .eq("user_id", "u-1")
            .order_desc("created_at");

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_query_custom_columns() {
        let query = SelectQuery::from("profiles")
            .columns("username,avatar_url,full_name")
            .eq("id", 42);

        let pairs = query.to_query_pairs();
        assert_eq!(pairs[0].1, "username,avatar_url,full_name");
        assert_eq!(pairs[1], ("id".to_string(), "eq.42".to_string()));
        assert_eq!(pairs.len(), 2);
    }
}
