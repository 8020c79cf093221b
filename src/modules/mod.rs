//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the hosted backend client (tables and object storage) and the
//! standalone MinIO store.

pub mod gateway;
pub mod storage;
