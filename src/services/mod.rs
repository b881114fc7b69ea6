//! Service layer of the reporting views.
//!
//! - Role-gated loading (`RoleGatedLoader`)
//! - Report aggregation (`aggregate_report`, `ReportRun`)
//! - View activation outcomes and stale-fetch guarding (`ViewOutcome`, `ViewState`)
//! - Named report and listing views (`ViewService`)

pub mod gate;
pub mod reports;
pub mod view;
pub mod views;

pub use gate::{Authorized, Gated, RoleGatedLoader};
pub use reports::{ReportOutput, ReportRun, aggregate_report};
pub use view::{FetchGeneration, FetchTicket, ViewOutcome, ViewState};
pub use views::ViewService;
