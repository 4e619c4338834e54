use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
}

pub const APPLICATION_STATUS_NAMES: &str = "pending, approved, rejected, under_review";

impl FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            _ => Err(()),
        }
    }
}

/// Application record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub scholarship_id: Uuid,
    pub user_id: Uuid,
    pub status: ApplicationStatus,
    pub application_data: String,
    pub submitted_at: OffsetDateTime,
    pub reviewed_at: Option<OffsetDateTime>,
    pub reviewed_by: Option<Uuid>,
    pub notes: Option<String>,
}

const APPLICATION_COLUMNS: &str = "id, scholarship_id, user_id, status, application_data, \
     submitted_at, reviewed_at, reviewed_by, notes";

pub async fn exists(db: &PgPool, scholarship_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM applications WHERE scholarship_id = $1 AND user_id = $2",
    )
    .bind(scholarship_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

/// Inserts a pending application. The UNIQUE (scholarship_id, user_id)
/// constraint is the authoritative duplicate guard: when two submissions
/// race past the pre-check, the loser's violation surfaces as
/// `AlreadyApplied`, not a generic failure.
pub async fn insert(
    db: &PgPool,
    scholarship_id: Uuid,
    user_id: Uuid,
    application_data: &str,
) -> Result<Application, ApiError> {
    let result = sqlx::query_as::<_, Application>(&format!(
        r#"
        INSERT INTO applications (scholarship_id, user_id, application_data)
        VALUES ($1, $2, $3)
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(scholarship_id)
    .bind(user_id)
    .bind(application_data)
    .fetch_one(db)
    .await;

    result.map_err(map_insert_error)
}

/// A unique violation on (scholarship_id, user_id) means a concurrent
/// submission won; everything else is a real failure.
fn map_insert_error(err: sqlx::Error) -> ApiError {
    match err {
        sqlx::Error::Database(e) if e.is_unique_violation() => ApiError::AlreadyApplied,
        e => ApiError::Internal(e.into()),
    }
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Application>> {
    let application = sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(application)
}

/// Overwrites the review fields unconditionally; no transition ordering is
/// enforced between the four statuses. Returns the updated row, or None
/// when the id is unknown.
pub async fn review(
    db: &PgPool,
    id: Uuid,
    status: ApplicationStatus,
    notes: Option<&str>,
    reviewer: Uuid,
) -> anyhow::Result<Option<Application>> {
    let application = sqlx::query_as::<_, Application>(&format!(
        r#"
        UPDATE applications
        SET status = $1, notes = $2, reviewed_at = now(), reviewed_by = $3
        WHERE id = $4
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(status)
    .bind(notes)
    .bind(reviewer)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(application)
}

/// Admin listing row with joined scholarship, applicant, and reviewer fields.
#[derive(Debug, Serialize, FromRow)]
pub struct AdminApplicationRow {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: OffsetDateTime,
    pub reviewed_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
    pub scholarship_title: String,
    pub amount: f64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub reviewer_first_name: Option<String>,
    pub reviewer_last_name: Option<String>,
}

pub async fn list_admin(
    db: &PgPool,
    status: Option<ApplicationStatus>,
    scholarship_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AdminApplicationRow>> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT
            a.id, a.status, a.submitted_at, a.reviewed_at, a.notes,
            s.title AS scholarship_title, s.amount,
            u.first_name, u.last_name, u.email,
            reviewer.first_name AS reviewer_first_name,
            reviewer.last_name AS reviewer_last_name
        FROM applications a
        JOIN scholarships s ON a.scholarship_id = s.id
        JOIN users u ON a.user_id = u.id
        LEFT JOIN users reviewer ON a.reviewed_by = reviewer.id
        WHERE 1=1
        "#,
    );
    if let Some(status) = status {
        qb.push(" AND a.status = ").push_bind(status);
    }
    if let Some(scholarship_id) = scholarship_id {
        qb.push(" AND a.scholarship_id = ").push_bind(scholarship_id);
    }
    qb.push(" ORDER BY a.submitted_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb
        .build_query_as::<AdminApplicationRow>()
        .fetch_all(db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_every_listed_name() {
        for name in ["pending", "approved", "rejected", "under_review"] {
            assert!(name.parse::<ApplicationStatus>().is_ok(), "{name}");
        }
        assert!("in_review".parse::<ApplicationStatus>().is_err());
        assert!("Approved".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::UnderReview).unwrap();
        assert_eq!(json, "\"under_review\"");
    }

    #[derive(Debug)]
    struct FakeDbError {
        unique: bool,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn losing_submission_race_maps_to_already_applied() {
        let err = sqlx::Error::Database(Box::new(FakeDbError { unique: true }));
        assert!(matches!(map_insert_error(err), ApiError::AlreadyApplied));
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = sqlx::Error::Database(Box::new(FakeDbError { unique: false }));
        assert!(matches!(map_insert_error(err), ApiError::Internal(_)));

        assert!(matches!(
            map_insert_error(sqlx::Error::RowNotFound),
            ApiError::Internal(_)
        ));
    }
}
