//! Dashboard KPIs: headline summary, daily trend and top reporters.

use std::sync::Arc;

use chrono::{Duration, Utc};

use mafs_auth::{RequestContext, require_form};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_database::store::TicketStore;
use mafs_entity::dashboard::{DashboardFilter, DashboardSummary, ReporterCount, TrendPoint};
use mafs_entity::permission::{FormAction, forms};

/// Trend window used when the caller gives no `from`.
const DEFAULT_TREND_DAYS: i64 = 30;
const DEFAULT_TOP_REPORTERS: i64 = 10;
const MAX_TOP_REPORTERS: i64 = 50;

/// Read-only KPI queries (form `dashboard`, view).
#[derive(Clone)]
pub struct DashboardService {
    tickets: Arc<dyn TicketStore>,
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService").finish()
    }
}

impl DashboardService {
    /// Creates a new dashboard service.
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    /// Counts per status, open and overdue counts, average resolution time
    /// and the downtime and cost-avoidance totals.
    pub async fn summary(
        &self,
        ctx: &RequestContext,
        filter: DashboardFilter,
    ) -> AppResult<DashboardSummary> {
        require_form(ctx, forms::DASHBOARD, FormAction::View)?;
        let filter = normalize(filter)?;
        self.tickets.summary(&filter, Utc::now()).await
    }

    /// Created and closed counts per day.
    pub async fn trend(
        &self,
        ctx: &RequestContext,
        filter: DashboardFilter,
    ) -> AppResult<Vec<TrendPoint>> {
        require_form(ctx, forms::DASHBOARD, FormAction::View)?;
        let mut filter = normalize(filter)?;
        if filter.from.is_none() {
            filter.from = Some(filter.to.unwrap_or_else(Utc::now) - Duration::days(DEFAULT_TREND_DAYS));
        }
        self.tickets.trend(&filter).await
    }

    /// Reporters by ticket count.
    pub async fn top_reporters(
        &self,
        ctx: &RequestContext,
        filter: DashboardFilter,
        limit: Option<i64>,
    ) -> AppResult<Vec<ReporterCount>> {
        require_form(ctx, forms::DASHBOARD, FormAction::View)?;
        let filter = normalize(filter)?;
        let limit = limit
            .unwrap_or(DEFAULT_TOP_REPORTERS)
            .clamp(1, MAX_TOP_REPORTERS);
        self.tickets.top_reporters(&filter, limit).await
    }
}

fn normalize(mut filter: DashboardFilter) -> AppResult<DashboardFilter> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(AppError::validation("'from' must not be after 'to'"));
        }
    }
    filter.plant = filter
        .plant
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty());
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use mafs_core::error::ErrorKind;
    use mafs_entity::user::PermissionLevel;

    use super::*;
    use crate::testing;
    use crate::ticket::{CreateTicketRequest, TicketService};

    #[tokio::test]
    async fn test_operator_has_no_dashboard() {
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let err = DashboardService::new(Arc::clone(&stores.tickets))
            .summary(&testing::ctx(&stores, &op).await, DashboardFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_summary_and_reporters() {
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let eng = testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, None).await;
        let tickets = TicketService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&stores.hierarchy),
        );
        let op_ctx = testing::ctx(&stores, &op).await;
        for title in ["A", "B"] {
            tickets
                .create(
                    &op_ctx,
                    CreateTicketRequest {
                        title: title.into(),
                        pucode: Some("MT1-PRESS-L01-M01".into()),
                        ..CreateTicketRequest::default()
                    },
                )
                .await
                .unwrap();
        }

        let svc = DashboardService::new(Arc::clone(&stores.tickets));
        let eng_ctx = testing::ctx(&stores, &eng).await;
        let summary = svc
            .summary(
                &eng_ctx,
                DashboardFilter {
                    plant: Some(" mt1 ".into()),
                    ..DashboardFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.open, 2);

        let top = svc
            .top_reporters(&eng_ctx, DashboardFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(top[0].user_id, op.id);
        assert_eq!(top[0].tickets, 2);

        let trend = svc.trend(&eng_ctx, DashboardFilter::default()).await.unwrap();
        assert_eq!(trend.iter().map(|p| p.created).sum::<i64>(), 2);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let (_, stores) = testing::stores();
        let eng = testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, None).await;
        let now = Utc::now();
        let err = DashboardService::new(Arc::clone(&stores.tickets))
            .summary(
                &testing::ctx(&stores, &eng).await,
                DashboardFilter {
                    from: Some(now),
                    to: Some(now - Duration::days(1)),
                    plant: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
