//! # mafs-service
//!
//! Business logic service layer. Each service orchestrates the stores, the
//! auth primitives and the messaging seam to implement one group of use
//! cases. Permission guards run here, so every caller (HTTP or CLI) gets
//! the same checks.
//!
//! Services follow constructor injection; all dependencies are provided at
//! construction time via `Arc` references.

pub mod auth;
pub mod dashboard;
pub mod hierarchy;
pub mod notification;
pub mod permission;
pub mod ticket;
pub mod user;

pub use auth::{AuthService, LoginResult};
pub use dashboard::DashboardService;
pub use hierarchy::HierarchyService;
pub use mafs_auth::RequestContext;
pub use notification::{
    DueDateNotificationService, NotificationSummary, NotificationTask,
    OldOpenTicketsNotificationService, PendingTicketsNotificationService,
};
pub use permission::FormPermissionService;
pub use ticket::{TicketService, UploadService, UploadedFile, WorkflowRequest};
pub use user::{AdminUserService, UserService};

#[cfg(test)]
pub(crate) mod testing;
