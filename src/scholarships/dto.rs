use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::scholarships::repo::{
    AdminScholarship, Category, NewScholarship, Scholarship, ScholarshipPatch, ScholarshipStatus,
    StringList, CATEGORY_NAMES, STATUS_NAMES,
};
use crate::validation::Validator;

/// Query parameters for the public catalog listing.
#[derive(Debug, Deserialize)]
pub struct ListScholarshipsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "minAmount")]
    pub min_amount: Option<f64>,
    #[serde(rename = "maxAmount")]
    pub max_amount: Option<f64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated pagination; page past the last one just yields an empty list.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn validate(v: &mut Validator, page: Option<i64>, limit: Option<i64>) -> Self {
        let page = v.optional_int("page", page, 1, i64::MAX).unwrap_or(1);
        let limit = v.optional_int("limit", limit, 1, 100).unwrap_or(20);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        // Saturate so an absurdly large page stays a valid OFFSET and
        // returns an empty list instead of overflowing.
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Public shape of a scholarship: everything a student sees in the catalog.
#[derive(Debug, Serialize)]
pub struct ScholarshipResponse {
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
}

impl From<Scholarship> for ScholarshipResponse {
    fn from(s: Scholarship) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            amount: s.amount,
            deadline: s.deadline,
            category: s.category,
            eligibility: s.eligibility,
            requirements: s.requirements,
            featured: s.featured,
            application_link: s.application_link,
            contact_email: s.contact_email,
            max_recipients: s.max_recipients,
            renewable: s.renewable,
            gpa_requirement: s.gpa_requirement,
            field_of_study: s.field_of_study,
            status: s.status,
        }
    }
}

/// Admin listing entry: full record plus creator and application count.
#[derive(Debug, Serialize)]
pub struct AdminScholarshipResponse {
    #[serde(flatten)]
    pub scholarship: ScholarshipResponse,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub created_by: Option<Uuid>,
    pub created_by_name: Option<String>,
    pub created_by_lastname: Option<String>,
    pub application_count: i64,
}

impl From<AdminScholarship> for AdminScholarshipResponse {
    fn from(row: AdminScholarship) -> Self {
        let created_at = row.scholarship.created_at;
        let updated_at = row.scholarship.updated_at;
        let created_by = row.scholarship.created_by;
        Self {
            scholarship: row.scholarship.into(),
            created_at,
            updated_at,
            created_by,
            created_by_name: row.created_by_name,
            created_by_lastname: row.created_by_lastname,
            application_count: row.application_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedScholarship {
    pub id: Uuid,
}

/// Admin create body. Everything optional so the validation layer reports
/// all missing fields together.
#[derive(Debug, Deserialize)]
pub struct CreateScholarshipRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<String>,
    pub category: Option<String>,
    pub eligibility: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub contact_email: Option<String>,
    pub max_recipients: Option<i64>,
    pub renewable: Option<bool>,
    pub featured: Option<bool>,
    pub gpa_requirement: Option<f64>,
    pub field_of_study: Option<Vec<String>>,
    pub application_link: Option<String>,
}

impl CreateScholarshipRequest {
    pub fn validate(self) -> Result<NewScholarship, ApiError> {
        let mut v = Validator::new();
        let title = v.require_str("title", self.title.as_deref(), 1, 255);
        let description = v.require_str("description", self.description.as_deref(), 1, 10_000);
        let amount = v.require_number("amount", self.amount, 0.0, f64::MAX);
        let deadline = v.require_date("deadline", self.deadline.as_deref());
        let category =
            v.require_enum::<Category>("category", self.category.as_deref(), CATEGORY_NAMES);
        let eligibility = v.require_list("eligibility", self.eligibility);
        let requirements = v.require_list("requirements", self.requirements);
        let contact_email = v.require_email("contact_email", self.contact_email.as_deref());
        let max_recipients = v.optional_int("max_recipients", self.max_recipients, 1, i32::MAX as i64);
        let gpa_requirement = v.optional_number("gpa_requirement", self.gpa_requirement, 0.0, 4.0);
        let field_of_study = v.optional_list("field_of_study", self.field_of_study);
        v.finish()?;

        Ok(NewScholarship {
            title: title.unwrap(),
            description: description.unwrap(),
            amount: amount.unwrap(),
            deadline: deadline.unwrap(),
            category: category.unwrap(),
            eligibility: eligibility.unwrap().into(),
            requirements: requirements.unwrap().into(),
            contact_email: contact_email.unwrap(),
            max_recipients: max_recipients.unwrap_or(1) as i32,
            renewable: self.renewable.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
            gpa_requirement,
            field_of_study: field_of_study.map(Into::into),
            application_link: self.application_link,
        })
    }
}

/// Admin update body: any subset of fields; an empty body is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateScholarshipRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<String>,
    pub category: Option<String>,
    pub eligibility: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub contact_email: Option<String>,
    pub max_recipients: Option<i64>,
    pub renewable: Option<bool>,
    pub featured: Option<bool>,
    pub gpa_requirement: Option<f64>,
    pub field_of_study: Option<Vec<String>>,
    pub application_link: Option<String>,
    pub status: Option<String>,
}

impl UpdateScholarshipRequest {
    pub fn validate(self) -> Result<ScholarshipPatch, ApiError> {
        let mut v = Validator::new();
        let title = self
            .title
            .as_deref()
            .and_then(|t| v.require_str("title", Some(t), 1, 255));
        let description = self
            .description
            .as_deref()
            .and_then(|d| v.require_str("description", Some(d), 1, 10_000));
        let amount = v.optional_number("amount", self.amount, 0.0, f64::MAX);
        let deadline = v.optional_date("deadline", self.deadline.as_deref());
        let category =
            v.optional_enum::<Category>("category", self.category.as_deref(), CATEGORY_NAMES);
        let eligibility = v.optional_list("eligibility", self.eligibility);
        let requirements = v.optional_list("requirements", self.requirements);
        let contact_email = v.optional_email("contact_email", self.contact_email.as_deref());
        let max_recipients = v.optional_int("max_recipients", self.max_recipients, 1, i32::MAX as i64);
        let gpa_requirement = v.optional_number("gpa_requirement", self.gpa_requirement, 0.0, 4.0);
        let field_of_study = v.optional_list("field_of_study", self.field_of_study);
        let status = v.optional_enum::<ScholarshipStatus>(
            "status",
            self.status.as_deref(),
            STATUS_NAMES,
        );
        v.finish()?;

        let patch = ScholarshipPatch {
            title,
            description,
            amount,
            deadline,
            category,
            eligibility: eligibility.map(Into::into),
            requirements: requirements.map(Into::into),
            contact_email,
            max_recipients: max_recipients.map(|m| m as i32),
            renewable: self.renewable,
            featured: self.featured,
            gpa_requirement,
            field_of_study: field_of_study.map(Into::into),
            application_link: self.application_link,
            status,
        };

        if patch.is_empty() {
            return Err(ApiError::BadRequest("No valid fields to update".into()));
        }
        Ok(patch)
    }
}

/// Admin listing filters.
#[derive(Debug, Deserialize)]
pub struct AdminScholarshipsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_create_request() -> CreateScholarshipRequest {
        CreateScholarshipRequest {
            title: Some("Merit Award".into()),
            description: Some("For outstanding students".into()),
            amount: Some(5000.0),
            deadline: Some("2099-01-01".into()),
            category: Some("STEM".into()),
            eligibility: Some(vec!["3.5 GPA".into()]),
            requirements: Some(vec!["Essay".into()]),
            contact_email: Some("aid@university.edu".into()),
            max_recipients: None,
            renewable: None,
            featured: None,
            gpa_requirement: Some(3.5),
            field_of_study: None,
            application_link: None,
        }
    }

    #[test]
    fn create_request_applies_defaults() {
        let new = full_create_request().validate().expect("valid");
        assert_eq!(new.max_recipients, 1);
        assert!(!new.renewable);
        assert!(!new.featured);
        assert_eq!(new.category, Category::Stem);
    }

    #[test]
    fn create_request_reports_every_missing_field() {
        let request = CreateScholarshipRequest {
            title: None,
            description: None,
            amount: None,
            deadline: None,
            category: None,
            eligibility: None,
            requirements: None,
            contact_email: None,
            max_recipients: None,
            renewable: None,
            featured: None,
            gpa_requirement: None,
            field_of_study: None,
            application_link: None,
        };
        match request.validate() {
            Err(ApiError::Validation(errors)) => assert_eq!(errors.len(), 8),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn create_request_rejects_out_of_range_gpa() {
        let mut request = full_create_request();
        request.gpa_requirement = Some(4.5);
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn empty_update_is_bad_request() {
        let result = UpdateScholarshipRequest::default().validate();
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn partial_update_keeps_only_provided_fields() {
        let request = UpdateScholarshipRequest {
            status: Some("expired".into()),
            amount: Some(2500.0),
            ..Default::default()
        };
        let patch = request.validate().expect("valid patch");
        assert_eq!(patch.status, Some(ScholarshipStatus::Expired));
        assert_eq!(patch.amount, Some(2500.0));
        assert!(patch.title.is_none());
    }

    #[test]
    fn update_rejects_unknown_status() {
        let request = UpdateScholarshipRequest {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn page_params_default_and_clamp() {
        let mut v = Validator::new();
        let params = PageParams::validate(&mut v, None, None);
        assert!(v.is_ok());
        assert_eq!((params.page, params.limit), (1, 20));
        assert_eq!(params.offset(), 0);

        let mut v = Validator::new();
        let params = PageParams::validate(&mut v, Some(3), Some(10));
        assert_eq!(params.offset(), 20);
        assert!(v.is_ok());

        let mut v = Validator::new();
        PageParams::validate(&mut v, Some(0), Some(500));
        assert!(v.finish().is_err());
    }

    #[test]
    fn offset_saturates_for_huge_page() {
        let mut v = Validator::new();
        let params = PageParams::validate(&mut v, Some(i64::MAX), Some(20));
        assert!(v.is_ok());
        assert_eq!(params.offset(), i64::MAX);
    }
}
