mod profile;

pub use profile::ProfileSummary;
