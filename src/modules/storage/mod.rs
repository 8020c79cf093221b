//! Storage module for evidence images outside the hosted backend
//!
//! Provides a MinIO/S3-compatible [`ObjectStore`](crate::modules::gateway::ObjectStore).

mod minio_client;

pub use minio_client::MinIOClient;
