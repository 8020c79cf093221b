mod complaint;
mod draft;
mod submitter;

pub use complaint::{
    Complaint, ComplaintCategory, ComplaintPatch, ComplaintPriority, ComplaintStatus,
    NewComplaint,
};
pub use draft::{ComplaintDraft, ImageFile};
pub use submitter::{ComplaintEntry, Submitter, SubmitterStatus};
