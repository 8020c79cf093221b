//! In-memory gateway backend
//!
//! Implements both [`TableGateway`] and [`ObjectStore`] without a network. Used for
//! local development (`GATEWAY_BACKEND=memory`) and as the test double for every
//! service: it records each call, applies per-table column defaults the way the
//! hosted database would, and can be told to fail or hold specific operations.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value};
use tokio::sync::Notify;
use uuid::Uuid;

use super::{Filter, GatewayError, ObjectStore, SelectQuery, TableGateway};

/// Calls kept in the log; older ones are dropped first
pub const CALL_LOG_LIMIT: usize = 1024;

/// Operation kinds, used for the call log, faults, and gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Select,
    Insert,
    Update,
    Delete,
    Upload,
    SignUrl,
    PublicUrl,
}

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub op: GatewayOp,
    /// Table name or bucket name
    pub target: String,
    pub filters: Vec<Filter>,
    /// Inserted record, update patch, or object path
    pub payload: Option<Value>,
}

#[derive(Debug, Clone)]
struct Fault {
    op: GatewayOp,
    target: String,
    filter: Option<Filter>,
    message: String,
}

impl Fault {
    fn matches(&self, op: GatewayOp, target: &str, filters: &[Filter]) -> bool {
        self.op == op
            && self.target == target
            && self.filter.as_ref().map_or(true, |f| filters.contains(f))
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    size: usize,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    defaults: HashMap<String, Map<String, Value>>,
    objects: HashMap<(String, String), StoredObject>,
    calls: VecDeque<GatewayCall>,
    faults: Vec<Fault>,
}

#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
    gates: Mutex<HashMap<GatewayOp, Arc<Notify>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column default applied on insert when the record omits the column
    pub fn with_column_default(self, table: &str, column: &str, value: Value) -> Self {
        self.lock()
            .defaults
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), value);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Put rows into a table as-is (no defaults, no generated columns)
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Current rows of a table, in storage order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .count()
    }

    pub fn object_size(&self, bucket: &str, path: &str) -> Option<usize> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.size)
    }

    pub fn object_content_type(&self, bucket: &str, path: &str) -> Option<String> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.content_type.clone())
    }

    /// Most recent calls, oldest first
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.iter().cloned().collect()
    }

    pub fn calls_of(&self, op: GatewayOp) -> Vec<GatewayCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make every `op` on `target` fail with `message`
    pub fn fail(&self, op: GatewayOp, target: &str, message: &str) {
        self.lock().faults.push(Fault {
            op,
            target: target.to_string(),
            filter: None,
            message: message.to_string(),
        });
    }

    /// Make `op` on `target` fail only when the call carries `filter`
    pub fn fail_where(&self, op: GatewayOp, target: &str, filter: Filter, message: &str) {
        self.lock().faults.push(Fault {
            op,
            target: target.to_string(),
            filter: Some(filter),
            message: message.to_string(),
        });
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Hold the next `op` until the returned handle is notified
    pub fn gate(&self, op: GatewayOp) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(op, Arc::clone(&notify));
        notify
    }

    async fn pass_gate(&self, op: GatewayOp) {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&op);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    /// Log the call, then fail it if a fault matches
    fn record(
        &self,
        op: GatewayOp,
        target: &str,
        filters: &[Filter],
        payload: Option<Value>,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if state.calls.len() >= CALL_LOG_LIMIT {
            state.calls.pop_front();
        }
        state.calls.push_back(GatewayCall {
            op,
            target: target.to_string(),
            filters: filters.to_vec(),
            payload,
        });

        match state.faults.iter().find(|f| f.matches(op, target, filters)) {
            Some(fault) => Err(match op {
                GatewayOp::Upload | GatewayOp::SignUrl | GatewayOp::PublicUrl => {
                    GatewayError::Storage(fault.message.clone())
                }
                _ => GatewayError::Rejected {
                    status: 400,
                    message: fault.message.clone(),
                },
            }),
            None => Ok(()),
        }
    }
}

/// Column value as the string PostgREST would compare against
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn row_matches(row: &Value, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| column_text(row, &f.column).as_deref() == Some(f.value.as_str()))
}

fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}

/// Timestamps compare chronologically, everything else textually; nulls rank highest
fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (column_text(a, column), column_text(b, column)) {
        (Some(x), Some(y)) => match (parse_timestamp(&x), parse_timestamp(&y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep only the requested columns (`*` keeps everything)
fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }
    let mut projected = Map::new();
    for column in columns.split(',').map(str::trim) {
        if let Some(value) = row.get(column) {
            projected.insert(column.to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

#[async_trait]
impl TableGateway for InMemoryGateway {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, GatewayError> {
        self.pass_gate(GatewayOp::Select).await;
        self.record(GatewayOp::Select, &query.table, &query.filters, None)?;

        let state = self.lock();
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row_matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_column(a, b, &order.column);
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        Ok(rows.iter().map(|row| project(row, &query.columns)).collect())
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value, GatewayError> {
        self.pass_gate(GatewayOp::Insert).await;
        self.record(GatewayOp::Insert, table, &[], Some(record.clone()))?;

        let Value::Object(mut fields) = record else {
            return Err(GatewayError::Rejected {
                status: 400,
                message: "Record must be a JSON object".to_string(),
            });
        };

        let mut state = self.lock();
        if let Some(defaults) = state.defaults.get(table) {
            for (column, value) in defaults {
                match fields.get(column) {
                    None | Some(Value::Null) => {
                        fields.insert(column.clone(), value.clone());
                    }
                    Some(_) => {}
                }
            }
        }
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let row = Value::Object(fields);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Value, GatewayError> {
        self.pass_gate(GatewayOp::Update).await;
        self.record(GatewayOp::Update, table, filters, Some(patch.clone()))?;

        let Value::Object(patch) = patch else {
            return Err(GatewayError::Rejected {
                status: 400,
                message: "Patch must be a JSON object".to_string(),
            });
        };

        let mut state = self.lock();
        let mut updated = None;
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| row_matches(row, filters)) {
                if let Value::Object(fields) = row {
                    for (column, value) in &patch {
                        fields.insert(column.clone(), value.clone());
                    }
                }
                if updated.is_none() {
                    updated = Some(row.clone());
                }
            }
        }

        updated.ok_or_else(|| GatewayError::NotFound(table.to_string()))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
        self.pass_gate(GatewayOp::Delete).await;
        self.record(GatewayOp::Delete, table, filters, None)?;

        if let Some(rows) = self.lock().tables.get_mut(table) {
            rows.retain(|row| !row_matches(row, filters));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryGateway {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        self.pass_gate(GatewayOp::Upload).await;
        self.record(
            GatewayOp::Upload,
            bucket,
            &[],
            Some(Value::String(path.to_string())),
        )?;

        let key = (bucket.to_string(), path.to_string());
        let mut state = self.lock();
        if state.objects.contains_key(&key) {
            return Err(GatewayError::Storage(format!(
                "Object '{}' already exists",
                path
            )));
        }
        state.objects.insert(
            key,
            StoredObject {
                content_type: content_type.to_string(),
                size: data.len(),
            },
        );
        Ok(path.to_string())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u32,
    ) -> Result<String, GatewayError> {
        self.pass_gate(GatewayOp::SignUrl).await;
        self.record(
            GatewayOp::SignUrl,
            bucket,
            &[],
            Some(Value::String(path.to_string())),
        )?;

        if !self
            .lock()
            .objects
            .contains_key(&(bucket.to_string(), path.to_string()))
        {
            return Err(GatewayError::Storage(format!("Object '{}' not found", path)));
        }

        Ok(format!(
            "memory://{}/{}?token={}&expires_in={}",
            bucket,
            path,
            Uuid::new_v4().simple(),
            ttl_secs
        ))
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, GatewayError> {
        self.record(
            GatewayOp::PublicUrl,
            bucket,
            &[],
            Some(Value::String(path.to_string())),
        )?;
        Ok(format!("memory://public/{}/{}", bucket, path))
    }
}
