use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::applications::repo::ApplicationStatus;

#[derive(Debug, Serialize, FromRow)]
pub struct ScholarshipStats {
    pub total_scholarships: i64,
    pub active_scholarships: i64,
    pub featured_scholarships: i64,
    pub total_funding: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ApplicationStats {
    pub total_applications: i64,
    pub pending_applications: i64,
    pub approved_applications: i64,
    pub rejected_applications: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserStats {
    pub total_users: i64,
    pub admin_users: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecentApplication {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: OffsetDateTime,
    pub scholarship_title: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

pub async fn scholarship_stats(db: &PgPool) -> anyhow::Result<ScholarshipStats> {
    let stats = sqlx::query_as::<_, ScholarshipStats>(
        r#"
        SELECT
            COUNT(*) AS total_scholarships,
            COUNT(*) FILTER (WHERE status = 'active') AS active_scholarships,
            COUNT(*) FILTER (WHERE featured) AS featured_scholarships,
            COALESCE(SUM(amount) FILTER (WHERE status = 'active'), 0) AS total_funding
        FROM scholarships
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(stats)
}

pub async fn application_stats(db: &PgPool) -> anyhow::Result<ApplicationStats> {
    let stats = sqlx::query_as::<_, ApplicationStats>(
        r#"
        SELECT
            COUNT(*) AS total_applications,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending_applications,
            COUNT(*) FILTER (WHERE status = 'approved') AS approved_applications,
            COUNT(*) FILTER (WHERE status = 'rejected') AS rejected_applications
        FROM applications
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(stats)
}

pub async fn user_stats(db: &PgPool) -> anyhow::Result<UserStats> {
    let stats = sqlx::query_as::<_, UserStats>(
        r#"
        SELECT
            COUNT(*) AS total_users,
            COUNT(*) FILTER (WHERE role = 'admin') AS admin_users
        FROM users
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(stats)
}

pub async fn recent_applications(db: &PgPool, limit: i64) -> anyhow::Result<Vec<RecentApplication>> {
    let rows = sqlx::query_as::<_, RecentApplication>(
        r#"
        SELECT
            a.id, a.status, a.submitted_at,
            s.title AS scholarship_title,
            u.first_name, u.last_name, u.email
        FROM applications a
        JOIN scholarships s ON a.scholarship_id = s.id
        JOIN users u ON a.user_id = u.id
        ORDER BY a.submitted_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
