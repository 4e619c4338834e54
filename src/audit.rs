use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// One append-only row per mutating workflow call.
#[derive(Debug)]
pub struct AuditEntry {
    pub actor: Option<Uuid>,
    pub action: &'static str,
    pub table_name: &'static str,
    pub record_id: Option<Uuid>,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    pub fn new(action: &'static str, table_name: &'static str) -> Self {
        Self {
            actor: None,
            action,
            table_name,
            record_id: None,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn actor(mut self, actor: Uuid) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn record(mut self, id: Uuid) -> Self {
        self.record_id = Some(id);
        self
    }

    pub fn old_values(mut self, values: impl Into<String>) -> Self {
        self.old_values = Some(values.into());
        self
    }

    pub fn new_values(mut self, values: impl Into<String>) -> Self {
        self.new_values = Some(values.into());
        self
    }

    pub fn meta(mut self, meta: &RequestMeta) -> Self {
        self.ip_address = meta.ip.clone();
        self.user_agent = meta.user_agent.clone();
        self
    }
}

/// Appends the entry. A failed audit write must never fail the request,
/// so errors are logged and swallowed here.
pub async fn record(db: &PgPool, entry: AuditEntry) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs
            (user_id, action, table_name, record_id, old_values, new_values, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.actor)
    .bind(entry.action)
    .bind(entry.table_name)
    .bind(entry.record_id)
    .bind(entry.old_values)
    .bind(entry.new_values)
    .bind(entry.ip_address)
    .bind(entry.user_agent)
    .execute(db)
    .await;

    if let Err(e) = result {
        warn!(error = %e, action = entry.action, "audit log write failed");
    }
}

/// Client metadata attached to audit entries and used as the rate-limit key.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn rate_limit_key(&self) -> &str {
        self.ip.as_deref().unwrap_or("unknown")
    }

    fn from_parts(parts: &Parts) -> Self {
        let ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string())
            });
        let user_agent = parts
            .headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        Self { ip, user_agent }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestMeta::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn prefers_first_forwarded_ip() {
        let parts = parts_with(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        let meta = RequestMeta::from_parts(&parts);
        assert_eq!(meta.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn falls_back_to_real_ip_then_unknown() {
        let parts = parts_with(&[("x-real-ip", "198.51.100.7")]);
        let meta = RequestMeta::from_parts(&parts);
        assert_eq!(meta.rate_limit_key(), "198.51.100.7");

        let meta = RequestMeta::from_parts(&parts_with(&[]));
        assert_eq!(meta.rate_limit_key(), "unknown");
    }

    #[test]
    fn captures_user_agent() {
        let parts = parts_with(&[("user-agent", "Mozilla/5.0")]);
        let meta = RequestMeta::from_parts(&parts);
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
