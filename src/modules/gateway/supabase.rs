//! Supabase client (PostgREST tables + Storage objects)
//!
//! Talks to `{url}/rest/v1` for table rows and `{url}/storage/v1` for objects,
//! authenticating every request with the configured API key.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::query::filter_pairs;
use super::{Filter, GatewayError, ObjectStore, SelectQuery, TableGateway};

/// Error body returned by PostgREST and Storage
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client: Client::new(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn storage_url(&self, route: &str, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/{}/{}/{}",
            self.base_url,
            route,
            bucket,
            encode_object_path(path)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Turn a non-success response into a [`GatewayError::Rejected`]
    async fn check(response: Response) -> Result<Response, GatewayError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error).or(b.details))
            .unwrap_or(body);

        Err(GatewayError::Rejected { status, message })
    }

    /// First row of a `return=representation` response
    fn first_row(table: &str, rows: Vec<Value>) -> Result<Value, GatewayError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(table.to_string()))
    }
}

#[async_trait]
impl TableGateway for SupabaseClient {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, GatewayError> {
        debug!("select from '{}' ({} filters)", query.table, query.filters.len());

        let response = self
            .authorized(self.http_client.get(self.rest_url(&query.table)))
            .query(&query.to_query_pairs())
            .send()
            .await?;

        let rows = Self::check(response).await?.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value, GatewayError> {
        debug!("insert into '{}'", table);

        let response = self
            .authorized(self.http_client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(&json!([record]))
            .send()
            .await?;

        let rows = Self::check(response).await?.json::<Vec<Value>>().await?;
        Self::first_row(table, rows)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Value, GatewayError> {
        debug!("update '{}' ({} filters)", table, filters.len());

        let response = self
            .authorized(self.http_client.patch(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .query(&filter_pairs(filters))
            .json(&patch)
            .send()
            .await?;

        let rows = Self::check(response).await?.json::<Vec<Value>>().await?;
        Self::first_row(table, rows)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
        debug!("delete from '{}' ({} filters)", table, filters.len());

        let response = self
            .authorized(self.http_client.delete(self.rest_url(table)))
            .query(&filter_pairs(filters))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for SupabaseClient {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let response = self
            .authorized(
                self.http_client
                    .post(self.storage_url("object", bucket, path)),
            )
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        Self::check(response).await?;
        debug!("Uploaded object '{}' to bucket '{}'", path, bucket);
        Ok(path.to_string())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u32,
    ) -> Result<String, GatewayError> {
        let response = self
            .authorized(
                self.http_client
                    .post(self.storage_url("object/sign", bucket, path)),
            )
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let signed = Self::check(response)
            .await?
            .json::<SignedUrlResponse>()
            .await?;

        Ok(absolute_signed_url(&self.base_url, &signed.signed_url))
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, GatewayError> {
        Ok(self.storage_url("object/public", bucket, path))
    }
}

/// Percent-encode each segment of an object path, keeping the separators
fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Storage answers with a path relative to `/storage/v1`
fn absolute_signed_url(base_url: &str, signed_path: &str) -> String {
    if signed_path.starts_with("http://") || signed_path.starts_with("https://") {
        return signed_path.to_string();
    }
    let relative = signed_path.trim_start_matches('/');
    format!("{}/storage/v1/{}", base_url, relative)
}
