//! PostgREST query builder.
//!
//! Filters are accumulated as query-string pairs and only sent when a
//! terminal method (`execute`, `single`, `insert`, `update`, `delete`) runs.

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

use crate::{check, Result, SupabaseClient, SupabaseError};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct QueryBuilder {
    client: SupabaseClient,
    table: String,
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    pub(crate) fn new(client: SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Columns (and embedded relations) to return.
    pub fn select(mut self, columns: &str) -> Self {
        self.set("select", columns.split_whitespace().collect::<String>());
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value)
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    pub fn ilike(self, column: &str, pattern: impl Display) -> Self {
        self.filter(column, "ilike", pattern)
    }

    pub fn in_<V: Display>(mut self, column: &str, values: &[V]) -> Self {
        let list = values
            .iter()
            .map(|v| quote_list_value(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.to_string(), format!("in.({})", list)));
        self
    }

    /// Raw `or=(...)` filter, e.g. `title.ilike.*cup*,description.ilike.*cup*`.
    pub fn or(mut self, filters: &str) -> Self {
        self.params.push(("or".to_string(), format!("({})", filters)));
        self
    }

    /// Append an ordering term. Multiple calls order by each in turn.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let term = format!("{}.{}", column, if ascending { "asc" } else { "desc" });
        match self.params.iter_mut().find(|(k, _)| k == "order") {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&term);
            }
            None => self.params.push(("order".to_string(), term)),
        }
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.set("limit", count.to_string());
        self
    }

    /// Inclusive row range, as in `range(0, 49)` for the first 50 rows.
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.set("offset", from.to_string());
        self.set("limit", (to.saturating_sub(from) + 1).to_string());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// GET all matching rows.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let resp = self.send(Method::GET, None::<&()>, false).await?;
        Ok(resp.json().await?)
    }

    /// GET exactly one row. Zero rows fails with code `PGRST116`.
    pub async fn single<T: DeserializeOwned>(self) -> Result<T> {
        let resp = self.send(Method::GET, None::<&()>, true).await?;
        Ok(resp.json().await?)
    }

    /// Like [`single`](Self::single) but zero rows is `Ok(None)`.
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self.single().await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_no_rows() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// POST new rows and return them as stored.
    pub async fn insert<B: Serialize, T: DeserializeOwned>(self, body: &B) -> Result<Vec<T>> {
        let resp = self.send(Method::POST, Some(body), false).await?;
        Ok(resp.json().await?)
    }

    /// POST one row and return it as stored.
    pub async fn insert_single<B: Serialize, T: DeserializeOwned>(self, body: &B) -> Result<T> {
        let resp = self.send(Method::POST, Some(body), true).await?;
        Ok(resp.json().await?)
    }

    /// PATCH matching rows and return them.
    pub async fn update<B: Serialize, T: DeserializeOwned>(self, body: &B) -> Result<Vec<T>> {
        let resp = self.send(Method::PATCH, Some(body), false).await?;
        Ok(resp.json().await?)
    }

    /// PATCH exactly one row and return it.
    pub async fn update_single<B: Serialize, T: DeserializeOwned>(self, body: &B) -> Result<T> {
        let resp = self.send(Method::PATCH, Some(body), true).await?;
        Ok(resp.json().await?)
    }

    /// DELETE matching rows. Refuses to run without a filter.
    pub async fn delete(self) -> Result<()> {
        if !self.has_filter() {
            return Err(SupabaseError::Config(format!(
                "refusing unfiltered delete on {}",
                self.table
            )));
        }
        self.send(Method::DELETE, None::<&()>, false).await?;
        Ok(())
    }

    fn filter(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.params
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    fn set(&mut self, key: &str, value: String) {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value));
    }

    fn has_filter(&self) -> bool {
        self.params
            .iter()
            .any(|(k, _)| !matches!(k.as_str(), "select" | "order" | "limit" | "offset"))
    }

    async fn send<B: Serialize>(
        self,
        method: Method,
        body: Option<&B>,
        single: bool,
    ) -> Result<reqwest::Response> {
        let url = self.client.rest_url(&self.table);
        tracing::trace!(table = %self.table, %method, params = ?self.params, "PostgREST request");

        let is_write = method != Method::GET;
        let mut req = self.client.request(method, &url).query(&self.params);
        if single {
            req = req.header("Accept", SINGLE_OBJECT);
        }
        if is_write {
            req = req.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        check(req.send().await?).await
    }
}

// Values containing PostgREST reserved characters must be double-quoted.
fn quote_list_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
