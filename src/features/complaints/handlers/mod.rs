pub mod admin_complaint_handler;
pub mod complaint_handler;

pub use admin_complaint_handler::*;
pub use complaint_handler::*;
