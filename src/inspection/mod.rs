//! Inspection cache: reusable discovery results and felling claims

pub mod record;
pub mod report;
pub mod cache;
pub mod reconcile;

pub use record::{InspectionRecord, RecordId};
pub use report::InspectionReport;
pub use cache::{ClaimError, InspectionCache};
pub use reconcile::{ReconcileJob, Reconciled};
