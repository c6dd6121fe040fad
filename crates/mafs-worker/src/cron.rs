//! Cron expression and timezone handling.

use chrono_tz::Tz;
use tokio_cron_scheduler::Job;

use mafs_core::error::AppError;

/// Adds the leading seconds field to a 5-field expression.
///
/// Expressions that already carry seconds (6 or 7 fields) are returned
/// trimmed and otherwise unchanged.
pub fn normalize(expr: &str) -> String {
    let expr = expr.split_whitespace().collect::<Vec<_>>().join(" ");
    if expr.split(' ').count() == 5 {
        format!("0 {expr}")
    } else {
        expr
    }
}

/// Resolves a schedule timezone. Null, empty or unknown names use UTC.
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => Tz::UTC,
        Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = name, "Unknown timezone, falling back to UTC");
            Tz::UTC
        }),
    }
}

/// Checks that an expression can drive a timer, returning it normalized.
///
/// Failures carry the `INVALID_CRON` code.
pub fn validate(expr: &str) -> Result<String, AppError> {
    if expr.trim().is_empty() {
        return Err(AppError::validation("Cron expression is required").with_code("INVALID_CRON"));
    }
    let normalized = normalize(expr);
    Job::new_async_tz(normalized.as_str(), Tz::UTC, |_, _| Box::pin(async {})).map_err(|e| {
        AppError::validation(format!("Invalid cron expression '{}': {e}", expr.trim()))
            .with_code("INVALID_CRON")
    })?;
    Ok(normalized)
}

/// Checks an explicit timezone name. Empty means UTC and is accepted.
///
/// Failures carry the `INVALID_TIMEZONE` code.
pub fn validate_timezone(name: Option<&str>) -> Result<(), AppError> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(()),
        Some(name) => name.parse::<Tz>().map(|_| ()).map_err(|_| {
            AppError::validation(format!("Unknown timezone '{name}'")).with_code("INVALID_TIMEZONE")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("0 9 * * *"), "0 0 9 * * *");
        assert_eq!(normalize("  30  8 * *   1-5 "), "0 30 8 * * 1-5");
        assert_eq!(normalize("0 0 9 * * *"), "0 0 9 * * *");
    }

    #[test]
    fn test_resolve_timezone() {
        assert_eq!(resolve_timezone(None), Tz::UTC);
        assert_eq!(resolve_timezone(Some("")), Tz::UTC);
        assert_eq!(resolve_timezone(Some("Asia/Bangkok")), chrono_tz::Asia::Bangkok);
        assert_eq!(resolve_timezone(Some("Mars/Olympus_Mons")), Tz::UTC);
    }

    #[tokio::test]
    async fn test_validate() {
        assert_eq!(validate("0 9 * * *").unwrap(), "0 0 9 * * *");
        let err = validate("every morning").unwrap_err();
        assert_eq!(err.code, Some("INVALID_CRON"));
        assert_eq!(validate("").unwrap_err().code, Some("INVALID_CRON"));
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone(Some("Asia/Tokyo")).is_ok());
        assert!(validate_timezone(None).is_ok());
        assert_eq!(
            validate_timezone(Some("Nowhere/City")).unwrap_err().code,
            Some("INVALID_TIMEZONE")
        );
    }
}
