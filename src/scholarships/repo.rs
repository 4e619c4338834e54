use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Fixed set of scholarship categories, stored as TEXT with a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Category {
    #[serde(rename = "Academic Excellence")]
    #[sqlx(rename = "Academic Excellence")]
    AcademicExcellence,
    #[serde(rename = "Need-Based")]
    #[sqlx(rename = "Need-Based")]
    NeedBased,
    #[serde(rename = "Research")]
    #[sqlx(rename = "Research")]
    Research,
    #[serde(rename = "Athletics")]
    #[sqlx(rename = "Athletics")]
    Athletics,
    #[serde(rename = "Community Service")]
    #[sqlx(rename = "Community Service")]
    CommunityService,
    #[serde(rename = "International")]
    #[sqlx(rename = "International")]
    International,
    #[serde(rename = "Arts & Culture")]
    #[sqlx(rename = "Arts & Culture")]
    ArtsCulture,
    #[serde(rename = "STEM")]
    #[sqlx(rename = "STEM")]
    Stem,
    #[serde(rename = "Business")]
    #[sqlx(rename = "Business")]
    Business,
    #[serde(rename = "Healthcare")]
    #[sqlx(rename = "Healthcare")]
    Healthcare,
}

pub const CATEGORY_NAMES: &str = "Academic Excellence, Need-Based, Research, Athletics, \
     Community Service, International, Arts & Culture, STEM, Business, Healthcare";

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AcademicExcellence => "Academic Excellence",
            Category::NeedBased => "Need-Based",
            Category::Research => "Research",
            Category::Athletics => "Athletics",
            Category::CommunityService => "Community Service",
            Category::International => "International",
            Category::ArtsCulture => "Arts & Culture",
            Category::Stem => "STEM",
            Category::Business => "Business",
            Category::Healthcare => "Healthcare",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Academic Excellence" => Ok(Category::AcademicExcellence),
            "Need-Based" => Ok(Category::NeedBased),
            "Research" => Ok(Category::Research),
            "Athletics" => Ok(Category::Athletics),
            "Community Service" => Ok(Category::CommunityService),
            "International" => Ok(Category::International),
            "Arts & Culture" => Ok(Category::ArtsCulture),
            "STEM" => Ok(Category::Stem),
            "Business" => Ok(Category::Business),
            "Healthcare" => Ok(Category::Healthcare),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ScholarshipStatus {
    Active,
    Inactive,
    Expired,
}

pub const STATUS_NAMES: &str = "active, inactive, expired";

impl FromStr for ScholarshipStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ScholarshipStatus::Active),
            "inactive" => Ok(ScholarshipStatus::Inactive),
            "expired" => Ok(ScholarshipStatus::Expired),
            _ => Err(()),
        }
    }
}

/// List-valued column stored as JSON text. Encode/decode happens only at the
/// storage boundary; application logic always sees the decoded list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn encode(&self) -> String {
        serde_json::to_string(&self.0).expect("Vec<String> always serializes")
    }

    pub fn decode(raw: &str) -> anyhow::Result<Self> {
        let items: Vec<String> = serde_json::from_str(raw)?;
        Ok(StringList(items))
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        StringList(items)
    }
}

/// Raw scholarship row; list columns are still JSON text here.
#[derive(Debug, Clone, FromRow)]
pub struct ScholarshipRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub deadline: Date,
    pub category: Category,
    pub eligibility: String,
    pub requirements: String,
    pub featured: bool,
    pub application_link: Option<String>,
    pub contact_email: String,
    pub max_recipients: i32,
    pub renewable: bool,
    pub gpa_requirement: Option<f64>,
    pub field_of_study: Option<String>,
    pub status: ScholarshipStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub created_by: Option<Uuid>,
}

/// Scholarship with list columns decoded; what the rest of the app works with.
#[derive(Debug, Clone, Serialize)]
pub struct Scholarship {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub deadline: Date,
    pub category: Category,
    pub eligibility: StringList,
    pub requirements: StringList,
    pub featured: bool,
    pub application_link: Option<String>,
    pub contact_email: String,
    pub max_recipients: i32,
    pub renewable: bool,
    pub gpa_requirement: Option<f64>,
    pub field_of_study: Option<StringList>,
    pub status: ScholarshipStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub created_by: Option<Uuid>,
}

impl TryFrom<ScholarshipRow> for Scholarship {
    type Error = anyhow::Error;

    fn try_from(row: ScholarshipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            amount: row.amount,
            deadline: row.deadline,
            category: row.category,
            eligibility: StringList::decode(&row.eligibility)?,
            requirements: StringList::decode(&row.requirements)?,
            featured: row.featured,
            application_link: row.application_link,
            contact_email: row.contact_email,
            max_recipients: row.max_recipients,
            renewable: row.renewable,
            gpa_requirement: row.gpa_requirement,
            field_of_study: row
                .field_of_study
                .as_deref()
                .map(StringList::decode)
                .transpose()?,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
        })
    }
}

fn decode_rows(rows: Vec<ScholarshipRow>) -> anyhow::Result<Vec<Scholarship>> {
    rows.into_iter().map(Scholarship::try_from).collect()
}

/// Validated input for creating a scholarship.
#[derive(Debug, Clone, Serialize)]
pub struct NewScholarship {
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub deadline: Date,
    pub category: Category,
    pub eligibility: StringList,
    pub requirements: StringList,
    pub contact_email: String,
    pub max_recipients: i32,
    pub renewable: bool,
    pub featured: bool,
    pub gpa_requirement: Option<f64>,
    pub field_of_study: Option<StringList>,
    pub application_link: Option<String>,
}

/// Closed field set for partial updates; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScholarshipPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<Date>,
    pub category: Option<Category>,
    pub eligibility: Option<StringList>,
    pub requirements: Option<StringList>,
    pub contact_email: Option<String>,
    pub max_recipients: Option<i32>,
    pub renewable: Option<bool>,
    pub featured: Option<bool>,
    pub gpa_requirement: Option<f64>,
    pub field_of_study: Option<StringList>,
    pub application_link: Option<String>,
    pub status: Option<ScholarshipStatus>,
}

impl ScholarshipPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.deadline.is_none()
            && self.category.is_none()
            && self.eligibility.is_none()
            && self.requirements.is_none()
            && self.contact_email.is_none()
            && self.max_recipients.is_none()
            && self.renewable.is_none()
            && self.featured.is_none()
            && self.gpa_requirement.is_none()
            && self.field_of_study.is_none()
            && self.application_link.is_none()
            && self.status.is_none()
    }
}

/// Filters for the public listing; always restricted to active, non-expired offers.
#[derive(Debug, Clone)]
pub struct PublicFilter {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub min_amount: f64,
    pub max_amount: f64,
}

const SCHOLARSHIP_COLUMNS: &str = "id, title, description, amount, deadline, category, \
     eligibility, requirements, featured, application_link, contact_email, max_recipients, \
     renewable, gpa_requirement, field_of_study, status, created_at, updated_at, created_by";

fn push_public_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PublicFilter) {
    qb.push(" WHERE status = 'active' AND deadline >= CURRENT_DATE");
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR category ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" AND amount BETWEEN ")
        .push_bind(filter.min_amount)
        .push(" AND ")
        .push_bind(filter.max_amount);
}

/// Public catalog page: featured offers first, then by soonest deadline.
pub async fn list_public(
    db: &PgPool,
    filter: &PublicFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Scholarship>> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {SCHOLARSHIP_COLUMNS} FROM scholarships"
    ));
    push_public_filters(&mut qb, filter);
    qb.push(" ORDER BY featured DESC, deadline ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb
        .build_query_as::<ScholarshipRow>()
        .fetch_all(db)
        .await?;
    decode_rows(rows)
}

pub async fn count_public(db: &PgPool, filter: &PublicFilter) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM scholarships");
    push_public_filters(&mut qb, filter);
    let (total,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(total)
}

pub async fn get_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Scholarship>> {
    let row = sqlx::query_as::<_, ScholarshipRow>(&format!(
        "SELECT {SCHOLARSHIP_COLUMNS} FROM scholarships WHERE id = $1 AND status = 'active'"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    row.map(Scholarship::try_from).transpose()
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Scholarship>> {
    let row = sqlx::query_as::<_, ScholarshipRow>(&format!(
        "SELECT {SCHOLARSHIP_COLUMNS} FROM scholarships WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    row.map(Scholarship::try_from).transpose()
}

pub async fn create(
    db: &PgPool,
    new: &NewScholarship,
    created_by: Uuid,
) -> anyhow::Result<Scholarship> {
    let row = sqlx::query_as::<_, ScholarshipRow>(&format!(
        r#"
        INSERT INTO scholarships (
            title, description, amount, deadline, category, eligibility, requirements,
            contact_email, max_recipients, renewable, featured, gpa_requirement,
            field_of_study, application_link, created_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {SCHOLARSHIP_COLUMNS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.amount)
    .bind(new.deadline)
    .bind(new.category)
    .bind(new.eligibility.encode())
    .bind(new.requirements.encode())
    .bind(&new.contact_email)
    .bind(new.max_recipients)
    .bind(new.renewable)
    .bind(new.featured)
    .bind(new.gpa_requirement)
    .bind(new.field_of_study.as_ref().map(StringList::encode))
    .bind(&new.application_link)
    .bind(created_by)
    .fetch_one(db)
    .await?;
    Scholarship::try_from(row)
}

/// Applies a partial update; returns the new row, or None when the id is unknown.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    patch: &ScholarshipPatch,
) -> anyhow::Result<Option<Scholarship>> {
    let mut qb = QueryBuilder::new("UPDATE scholarships SET updated_at = now()");
    if let Some(title) = &patch.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(description) = &patch.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(amount) = patch.amount {
        qb.push(", amount = ").push_bind(amount);
    }
    if let Some(deadline) = patch.deadline {
        qb.push(", deadline = ").push_bind(deadline);
    }
    if let Some(category) = patch.category {
        qb.push(", category = ").push_bind(category);
    }
    if let Some(eligibility) = &patch.eligibility {
        qb.push(", eligibility = ").push_bind(eligibility.encode());
    }
    if let Some(requirements) = &patch.requirements {
        qb.push(", requirements = ").push_bind(requirements.encode());
    }
    if let Some(contact_email) = &patch.contact_email {
        qb.push(", contact_email = ").push_bind(contact_email.clone());
    }
    if let Some(max_recipients) = patch.max_recipients {
        qb.push(", max_recipients = ").push_bind(max_recipients);
    }
    if let Some(renewable) = patch.renewable {
        qb.push(", renewable = ").push_bind(renewable);
    }
    if let Some(featured) = patch.featured {
        qb.push(", featured = ").push_bind(featured);
    }
    if let Some(gpa_requirement) = patch.gpa_requirement {
        qb.push(", gpa_requirement = ").push_bind(gpa_requirement);
    }
    if let Some(field_of_study) = &patch.field_of_study {
        qb.push(", field_of_study = ").push_bind(field_of_study.encode());
    }
    if let Some(application_link) = &patch.application_link {
        qb.push(", application_link = ").push_bind(application_link.clone());
    }
    if let Some(status) = patch.status {
        qb.push(", status = ").push_bind(status);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(format!(" RETURNING {SCHOLARSHIP_COLUMNS}"));

    let row = qb
        .build_query_as::<ScholarshipRow>()
        .fetch_optional(db)
        .await?;
    row.map(Scholarship::try_from).transpose()
}

/// Returns true when a row was deleted; applications cascade.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM scholarships WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Admin listing row: scholarship plus creator name and application count.
#[derive(Debug, FromRow)]
pub struct AdminScholarshipRow {
    #[sqlx(flatten)]
    pub scholarship: ScholarshipRow,
    pub created_by_name: Option<String>,
    pub created_by_lastname: Option<String>,
    pub application_count: i64,
}

pub struct AdminScholarship {
    pub scholarship: Scholarship,
    pub created_by_name: Option<String>,
    pub created_by_lastname: Option<String>,
    pub application_count: i64,
}

pub async fn list_admin(
    db: &PgPool,
    status: Option<ScholarshipStatus>,
    category: Option<Category>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AdminScholarship>> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT s.*, u.first_name AS created_by_name, u.last_name AS created_by_lastname,
               COUNT(a.id) AS application_count
        FROM scholarships s
        LEFT JOIN users u ON s.created_by = u.id
        LEFT JOIN applications a ON s.id = a.scholarship_id
        WHERE 1=1
        "#,
    );
    if let Some(status) = status {
        qb.push(" AND s.status = ").push_bind(status);
    }
    if let Some(category) = category {
        qb.push(" AND s.category = ").push_bind(category);
    }
    qb.push(" GROUP BY s.id, u.first_name, u.last_name ORDER BY s.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb
        .build_query_as::<AdminScholarshipRow>()
        .fetch_all(db)
        .await?;
    rows.into_iter()
        .map(|row| {
            Ok(AdminScholarship {
                scholarship: Scholarship::try_from(row.scholarship)?,
                created_by_name: row.created_by_name,
                created_by_lastname: row.created_by_lastname,
                application_count: row.application_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_roundtrips_through_json_text() {
        let list = StringList(vec!["3.5 GPA minimum".into(), "Full-time enrollment".into()]);
        let encoded = list.encode();
        assert_eq!(StringList::decode(&encoded).expect("decode"), list);
    }

    #[test]
    fn string_list_rejects_corrupt_text() {
        assert!(StringList::decode("not json").is_err());
        assert!(StringList::decode("{\"a\":1}").is_err());
    }

    #[test]
    fn category_parses_every_listed_name() {
        for name in [
            "Academic Excellence",
            "Need-Based",
            "Research",
            "Athletics",
            "Community Service",
            "International",
            "Arts & Culture",
            "STEM",
            "Business",
            "Healthcare",
        ] {
            let category: Category = name.parse().expect(name);
            assert_eq!(category.as_str(), name);
        }
        assert!("Underwater Basket Weaving".parse::<Category>().is_err());
    }

    #[test]
    fn category_serde_matches_display_names() {
        let json = serde_json::to_string(&Category::ArtsCulture).unwrap();
        assert_eq!(json, "\"Arts & Culture\"");
        let parsed: Category = serde_json::from_str("\"STEM\"").unwrap();
        assert_eq!(parsed, Category::Stem);
    }

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!(
            "active".parse::<ScholarshipStatus>(),
            Ok(ScholarshipStatus::Active)
        );
        assert!("Active".parse::<ScholarshipStatus>().is_err());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ScholarshipPatch::default().is_empty());
        let patch = ScholarshipPatch {
            title: Some("New title".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn row_decoding_fails_on_corrupt_list_column() {
        let row = ScholarshipRow {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: "d".into(),
            amount: 1000.0,
            deadline: time::macros::date!(2099 - 01 - 01),
            category: Category::Stem,
            eligibility: "garbage".into(),
            requirements: "[]".into(),
            featured: false,
            application_link: None,
            contact_email: "a@b.co".into(),
            max_recipients: 1,
            renewable: false,
            gpa_requirement: None,
            field_of_study: None,
            status: ScholarshipStatus::Active,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
            created_by: None,
        };
        assert!(Scholarship::try_from(row).is_err());
    }
}
