//! PostgREST query construction.
//!
//! A [`Query`] describes the `select`, filters, ordering and limit of a table
//! request and renders them as URL query pairs, e.g.
//! `select=*,brands(name)&status=eq.active&order=created_at.desc`.

use std::fmt;

/// A single column filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String),
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq(v) => write!(f, "eq.{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    select: Option<String>,
    filters: Vec<(String, Filter)>,
    order: Option<(String, Order)>,
    limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to return, including embedded resources (`*,tasks(*)`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), Filter::Eq(value.to_string())));
        self
    }

    /// Apply `eq` only when a value is present.
    pub fn eq_opt<V: ToString>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[(String, Filter)] {
        &self.filters
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }

    /// Render as key/value pairs for `reqwest::RequestBuilder::query`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);

        pairs.push((
            "select".to_string(),
            self.select.clone().unwrap_or_else(|| "*".to_string()),
        ));

        for (column, filter) in &self.filters {
            pairs.push((column.clone(), filter.to_string()));
        }

        if let Some((column, order)) = &self.order {
            let dir = match order {
                Order::Asc => "asc",
                Order::Desc => "desc",
            };
            pairs.push(("order".to_string(), format!("{}.{}", column, dir)));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_selects_everything() {
        assert_eq!(Query::new().to_pairs(), owned(&[("select", "*")]));
    }

    #[test]
    fn test_filters_order_and_limit() {
        let query = Query::new()
            .select("*,brands(name)")
            .eq("status", "active")
            .eq("brand_id", 7)
            .order("created_at", Order::Desc)
            .limit(20);

        assert_eq!(
            query.to_pairs(),
            owned(&[
                ("select", "*,brands(name)"),
                ("status", "eq.active"),
                ("brand_id", "eq.7"),
                ("order", "created_at.desc"),
                ("limit", "20"),
            ])
        );
    }

    #[test]
    fn test_eq_opt_skips_missing() {
        let query = Query::new()
            .eq_opt("month", Some(3))
            .eq_opt::<i32>("year", None);
        assert_eq!(query.filters().len(), 1);
        assert_eq!(query.filters()[0], ("month".to_string(), Filter::Eq("3".to_string())));
    }
}
