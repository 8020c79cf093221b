//! Screen state for the complaint pages, kept free of any rendering layer.

pub mod list_view;
pub mod scope;
pub mod submission_page;

pub use list_view::{ComplaintCard, ComplaintListView, ImageDisplay, ListDisplay, ListStats};
pub use scope::{ScopeHandle, ViewScope};
pub use submission_page::{ComplaintPage, ImageSelection, PagePhase, SubmitOutcome};
