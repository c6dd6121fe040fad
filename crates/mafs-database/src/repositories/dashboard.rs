//! KPI aggregate queries over the ticket table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_entity::dashboard::{
    DashboardFilter, DashboardSummary, ReporterCount, StatusCount, TrendPoint,
};

/// Scope shared by all dashboard queries: `$1` from, `$2` to, `$3` plant.
const SCOPE: &str = "FROM tickets t LEFT JOIN production_units pu ON pu.id = t.pu_id \
     WHERE ($1::timestamptz IS NULL OR t.created_at >= $1) \
     AND ($2::timestamptz IS NULL OR t.created_at < $2) \
     AND ($3::text IS NULL OR pu.plant = $3)";

pub(crate) async fn summary(
    pool: &PgPool,
    filter: &DashboardFilter,
    now: DateTime<Utc>,
) -> AppResult<DashboardSummary> {
    let counts_sql = format!(
        "SELECT t.status, COUNT(*) AS count {SCOPE} GROUP BY t.status ORDER BY t.status"
    );
    let status_counts = sqlx::query_as::<_, StatusCount>(&counts_sql)
        .bind(filter.from)
        .bind(filter.to)
        .bind(&filter.plant)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count by status", e))?;

    let totals_sql = format!(
        "SELECT COUNT(*), \
         COUNT(*) FILTER (WHERE t.status NOT IN ('closed', 'rejected_final')), \
         COUNT(*) FILTER (WHERE t.due_date < $4 \
             AND t.status NOT IN ('resolved', 'closed', 'rejected_final')), \
         (AVG(EXTRACT(EPOCH FROM (t.resolved_at - t.created_at)) / 3600.0) \
             FILTER (WHERE t.resolved_at IS NOT NULL))::DOUBLE PRECISION, \
         COALESCE(SUM(t.downtime_hours), 0)::DOUBLE PRECISION, \
         COALESCE(SUM(t.cost_avoidance), 0)::DOUBLE PRECISION \
         {SCOPE}"
    );
    let (total, open, overdue, avg_resolution_hours, total_downtime_hours, total_cost_avoidance): (
        i64,
        i64,
        i64,
        Option<f64>,
        f64,
        f64,
    ) = sqlx::query_as(&totals_sql)
        .bind(filter.from)
        .bind(filter.to)
        .bind(&filter.plant)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute KPIs", e))?;

    Ok(DashboardSummary {
        status_counts,
        total,
        open,
        overdue,
        avg_resolution_hours,
        total_downtime_hours,
        total_cost_avoidance,
    })
}

pub(crate) async fn trend(pool: &PgPool, filter: &DashboardFilter) -> AppResult<Vec<TrendPoint>> {
    sqlx::query_as::<_, TrendPoint>(
        "WITH created AS ( \
             SELECT (t.created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS n \
             FROM tickets t LEFT JOIN production_units pu ON pu.id = t.pu_id \
             WHERE ($1::timestamptz IS NULL OR t.created_at >= $1) \
             AND ($2::timestamptz IS NULL OR t.created_at < $2) \
             AND ($3::text IS NULL OR pu.plant = $3) \
             GROUP BY 1 \
         ), closed AS ( \
             SELECT (t.closed_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS n \
             FROM tickets t LEFT JOIN production_units pu ON pu.id = t.pu_id \
             WHERE t.closed_at IS NOT NULL \
             AND ($1::timestamptz IS NULL OR t.closed_at >= $1) \
             AND ($2::timestamptz IS NULL OR t.closed_at < $2) \
             AND ($3::text IS NULL OR pu.plant = $3) \
             GROUP BY 1 \
         ) \
         SELECT COALESCE(c.day, d.day) AS date, COALESCE(c.n, 0) AS created, \
             COALESCE(d.n, 0) AS closed \
         FROM created c FULL OUTER JOIN closed d ON c.day = d.day \
         ORDER BY 1 ASC",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(&filter.plant)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute trend", e))
}

pub(crate) async fn top_reporters(
    pool: &PgPool,
    filter: &DashboardFilter,
    limit: i64,
) -> AppResult<Vec<ReporterCount>> {
    let sql = format!(
        "SELECT u.id AS user_id, u.display_name, COUNT(*) AS tickets \
         {} \
         GROUP BY u.id, u.display_name ORDER BY tickets DESC, u.display_name ASC LIMIT $4",
        SCOPE.replacen(
            "FROM tickets t",
            "FROM tickets t JOIN users u ON u.id = t.created_by",
            1
        )
    );
    sqlx::query_as::<_, ReporterCount>(&sql)
        .bind(filter.from)
        .bind(filter.to)
        .bind(&filter.plant)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rank reporters", e))
}
