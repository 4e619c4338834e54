use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::applications::repo::{self, Application};
use crate::error::ApiError;
use crate::scholarships::repo as scholarships_repo;

/// A deadline strictly before today closes the scholarship; the deadline
/// day itself still accepts submissions.
pub fn check_deadline(deadline: Date, today: Date) -> Result<(), ApiError> {
    if deadline < today {
        Err(ApiError::DeadlinePassed)
    } else {
        Ok(())
    }
}

/// The submission workflow: existence/status gate, deadline gate, duplicate
/// pre-check, then insert. The pre-check gives the common case a clean error;
/// the storage unique constraint settles races (see `repo::insert`).
pub async fn submit_application(
    db: &PgPool,
    scholarship_id: Uuid,
    user_id: Uuid,
    application_data: &serde_json::Value,
) -> Result<Application, ApiError> {
    let scholarship = scholarships_repo::get_active(db, scholarship_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Scholarship not found or inactive".into()))?;

    check_deadline(scholarship.deadline, OffsetDateTime::now_utc().date())?;

    if repo::exists(db, scholarship_id, user_id)
        .await
        .map_err(ApiError::Internal)?
    {
        warn!(%scholarship_id, %user_id, "duplicate application attempt");
        return Err(ApiError::AlreadyApplied);
    }

    repo::insert(db, scholarship_id, user_id, &application_data.to_string()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn deadline_today_is_still_open() {
        let today = date!(2026 - 08 - 27);
        assert!(check_deadline(today, today).is_ok());
    }

    #[test]
    fn future_deadline_is_open() {
        assert!(check_deadline(date!(2099 - 01 - 01), date!(2026 - 08 - 27)).is_ok());
    }

    #[test]
    fn past_deadline_is_rejected() {
        let err = check_deadline(date!(2020 - 01 - 01), date!(2026 - 08 - 27)).unwrap_err();
        assert!(matches!(err, ApiError::DeadlinePassed));
    }

    #[test]
    fn yesterday_is_already_closed() {
        let err = check_deadline(date!(2026 - 08 - 26), date!(2026 - 08 - 27)).unwrap_err();
        assert!(matches!(err, ApiError::DeadlinePassed));
    }
}
