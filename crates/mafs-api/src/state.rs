//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use mafs_auth::{JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator};
use mafs_core::config::AppConfig;
use mafs_database::Stores;
use mafs_messaging::ProfileResolver;
use mafs_service::{
    AdminUserService, AuthService, DashboardService, FormPermissionService, HierarchyService,
    TicketService, UploadService, UserService,
};
use mafs_worker::NotificationScheduler;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Store backend
    pub stores: Stores,
    /// Notification jobs
    pub scheduler: Arc<NotificationScheduler>,

    // ── Services ─────────────────────────────────────────────
    /// Login and token authentication
    pub auth_service: Arc<AuthService>,
    /// Self-service profile operations
    pub user_service: Arc<UserService>,
    /// User administration
    pub admin_user_service: Arc<AdminUserService>,
    /// Tickets and their workflow
    pub ticket_service: Arc<TicketService>,
    /// Image uploads
    pub upload_service: Arc<UploadService>,
    /// KPI dashboard
    pub dashboard_service: Arc<DashboardService>,
    /// Plant hierarchy
    pub hierarchy_service: Arc<HierarchyService>,
    /// Form permission matrix
    pub permission_service: Arc<FormPermissionService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.stores.backend())
            .finish()
    }
}

impl AppState {
    /// Wires the services over `stores`.
    pub fn new(
        config: AppConfig,
        stores: Stores,
        profiles: Arc<dyn ProfileResolver>,
        scheduler: Arc<NotificationScheduler>,
    ) -> Self {
        let password_hasher = Arc::new(PasswordHasher::new());
        let password_validator = Arc::new(PasswordValidator::new(config.auth.password_min_length));
        let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&stores.users),
            Arc::clone(&stores.permissions),
            Arc::clone(&password_hasher),
            jwt_encoder,
            jwt_decoder,
            profiles,
        ));
        let user_service = Arc::new(UserService::new(
            Arc::clone(&stores.users),
            Arc::clone(&password_hasher),
            Arc::clone(&password_validator),
        ));
        let admin_user_service = Arc::new(AdminUserService::new(
            Arc::clone(&stores.users),
            password_hasher,
            password_validator,
        ));
        let ticket_service = Arc::new(TicketService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&stores.hierarchy),
        ));
        let upload_service = Arc::new(UploadService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            config.uploads.clone(),
        ));
        let dashboard_service = Arc::new(DashboardService::new(Arc::clone(&stores.tickets)));
        let hierarchy_service = Arc::new(HierarchyService::new(Arc::clone(&stores.hierarchy)));
        let permission_service =
            Arc::new(FormPermissionService::new(Arc::clone(&stores.permissions)));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            stores,
            scheduler,
            auth_service,
            user_service,
            admin_user_service,
            ticket_service,
            upload_service,
            dashboard_service,
            hierarchy_service,
            permission_service,
        }
    }
}
