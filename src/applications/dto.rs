use serde::Deserialize;
use uuid::Uuid;

/// Body for submitting an application; the payload is free-form and stored
/// serialized.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub application_data: Option<serde_json::Value>,
}

/// Body for the admin review transition. Status only has to be a member of
/// the enumeration; any ordering between statuses is deliberately not
/// enforced.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Admin listing filters.
#[derive(Debug, Deserialize)]
pub struct AdminApplicationsQuery {
    pub status: Option<String>,
    pub scholarship_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
