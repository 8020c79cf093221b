//! Student complaints.
//!
//! Students file complaints (with an optional evidence image), review and delete
//! their own; admins see every complaint with its submitter and move it through
//! `pending -> reviewed -> resolved | rejected`.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/complaints` | User | Own complaints, newest first |
//! | POST | `/api/complaints` | User | Submit (multipart, optional image) |
//! | DELETE | `/api/complaints/{id}` | User | Delete own open complaint |
//! | GET | `/api/admin/complaints` | Admin | All complaints with submitters |
//! | PATCH | `/api/admin/complaints/{id}` | Admin | Update status or fields |
//! | DELETE | `/api/admin/complaints/{id}` | Admin | Delete any complaint |
//!
//! [`store`] and [`views`] hold the client-side state the front end drives.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod views;

pub use services::{AdminComplaintService, ComplaintService, ImageUploadService};
pub use store::ComplaintStore;
