//! Complaint subsystem of the Ruang Aman student support platform.
//!
//! The crate talks to a hosted backend (table API + object storage) through the
//! gateway traits in [`modules::gateway`], exposes the complaint flows over HTTP,
//! and carries the view state machines the front end drives.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;
