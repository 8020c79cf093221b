//! Gateway module - client side of the hosted backend
//!
//! The backend exposes two surfaces: a table API (select/insert/update/delete with
//! equality filters and ordering) and an object store that issues public and signed
//! URLs. Both are modeled as traits so the complaint services never see a concrete
//! backend.

mod error;
mod memory;
mod query;
mod record;
mod supabase;

use async_trait::async_trait;
use serde_json::Value;

pub use error::GatewayError;
pub use memory::{GatewayCall, GatewayOp, InMemoryGateway};
pub use query::{Filter, Order, SelectQuery};
pub use record::{decode_row, decode_rows};
pub use supabase::SupabaseClient;

/// Table operations of the hosted backend.
///
/// Rows travel as raw JSON; callers decode them with [`decode_row`]/[`decode_rows`].
#[async_trait]
pub trait TableGateway: Send + Sync {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, GatewayError>;

    /// Insert one record, returning the stored row (generated id and timestamp included)
    async fn insert(&self, table: &str, record: Value) -> Result<Value, GatewayError>;

    /// Apply `patch` to the rows matching `filters`, returning the first updated row
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Value, GatewayError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError>;
}

/// Object storage of the hosted backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `path`; never overwrites an existing object.
    /// Returns the stored object path.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError>;

    /// Time-limited URL for a private object
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u32,
    ) -> Result<String, GatewayError>;

    /// Permanent URL, only reachable when the bucket allows anonymous reads
    fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, GatewayError>;
}
