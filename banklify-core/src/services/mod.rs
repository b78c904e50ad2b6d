//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one view or cross-cutting concern.

pub mod boundary;
pub mod cancel;
mod dashboard;
pub mod logging;
pub mod routing;
pub mod session;
pub mod submit;
mod transfer;

pub use boundary::{ErrorBoundary, Handled};
pub use cancel::{CancelToken, ViewScope};
pub use dashboard::{DashboardService, DashboardSnapshot};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use routing::{Route, RouteGuard};
pub use session::{SessionStore, SessionWatch};
pub use submit::{SubmitGate, SubmitPermit};
pub use transfer::TransferService;
