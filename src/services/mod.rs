//! Business logic services module.

pub mod action;
pub mod checkin;
pub mod dashboard;
pub mod queries;

pub use action::{validate_content, CheckinAction, PendingCheckin};
pub use checkin::CheckinContract;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use queries::{CheckinQueries, QueryCache, QueryKey, QueryKind, RetryPolicy};
