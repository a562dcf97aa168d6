//! Review queue - human decisions over pending extractions

pub mod actions;
pub mod queue;

pub use actions::{approve_extraction, reject_extraction, ApprovalOutcome};
pub use queue::{list_pending, PendingFilter, QueueOrder};
