//! Minimal PostgREST query builder.
//!
//! Filters follow PostgREST's query syntax (`col=eq.v`, `order=col.asc`,
//! `limit=n`). Every request carries the service-role key
//! both as `apikey` and as bearer token.

use std::fmt::Display;
use std::time::Duration;

use reqwest::header::CONTENT_RANGE;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SupabaseError};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extracts the total from a `Content-Range` header value (`0-24/3573`, `*/0`).
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// PostgREST client for one Supabase project.
#[derive(Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PostgrestClient {
    /// Creates a client for `https://<project>.supabase.co` using the
    /// service-role key.
    pub fn new(base_url: &str, service_key: &str) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(SupabaseError::Config("SUPABASE_URL is empty".into()));
        }
        if service_key.trim().is_empty() {
            return Err(SupabaseError::Config(
                "SUPABASE_SERVICE_ROLE_KEY is empty".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    /// Project URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a query on a table.
    pub fn from(&self, table: &str) -> Query<'_> {
        Query {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

/// Sends a request and turns error statuses into [`SupabaseError`].
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::from_response(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SupabaseError::Decode(e.to_string()))
}

/// A PostgREST request under construction.
#[derive(Debug)]
pub struct Query<'a> {
    client: &'a PostgrestClient,
    table: String,
    params: Vec<(String, String)>,
}

impl Query<'_> {
    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    /// Columns to return (`*` when unset).
    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns.to_string())
    }

    /// `column = value`.
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.param(column, format!("eq.{value}"))
    }

    /// Sort order.
    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.param("order", format!("{column}.{direction}"))
    }

    /// Row cap.
    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit.to_string())
    }

    /// Query string pairs built so far.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn builder(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.client.table_url(&self.table))
            .query(&self.params)
    }

    /// Runs a `GET` and decodes every row.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        decode(send(self.builder(Method::GET)).await?).await
    }

    /// Runs a `GET` limited to one row.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let rows: Vec<T> = self.limit(1).fetch().await?;
        Ok(rows.into_iter().next())
    }

    /// Counts matching rows with `Prefer: count=exact`.
    pub async fn count(self) -> Result<u64> {
        let response = send(
            self.limit(1)
                .builder(Method::GET)
                .header("Prefer", "count=exact"),
        )
        .await?;
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| SupabaseError::Decode("missing Content-Range total".into()))
    }

    /// Inserts rows.
    pub async fn insert<B: Serialize + ?Sized>(self, rows: &B) -> Result<()> {
        send(
            self.builder(Method::POST)
                .header("Prefer", "return=minimal")
                .json(rows),
        )
        .await?;
        Ok(())
    }

    /// Inserts rows, skipping those clashing on `on_conflict`.
    ///
    /// Returns how many rows were actually inserted.
    pub async fn insert_ignoring_duplicates<B: Serialize + ?Sized>(
        self,
        rows: &B,
        on_conflict: &str,
    ) -> Result<usize> {
        let response = send(
            self.param("on_conflict", on_conflict.to_string())
                .builder(Method::POST)
                .header("Prefer", "resolution=ignore-duplicates,return=representation")
                .json(rows),
        )
        .await?;
        let inserted: Vec<serde_json::Value> = decode(response).await?;
        Ok(inserted.len())
    }

    /// Inserts rows, merging into those clashing on `on_conflict`.
    pub async fn upsert<B: Serialize + ?Sized>(self, rows: &B, on_conflict: &str) -> Result<()> {
        send(
            self.param("on_conflict", on_conflict.to_string())
                .builder(Method::POST)
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(rows),
        )
        .await?;
        Ok(())
    }

    /// Patches matching rows and returns how many changed.
    pub async fn update<B: Serialize + ?Sized>(self, patch: &B) -> Result<usize> {
        let response = send(
            self.builder(Method::PATCH)
                .header("Prefer", "return=representation")
                .json(patch),
        )
        .await?;
        let updated: Vec<serde_json::Value> = decode(response).await?;
        Ok(updated.len())
    }
}
