use axum::extract::{FromRef, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, instrument, warn};

use crate::audit::{self, AuditEntry, RequestMeta};
use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest};
use crate::auth::extractors::AuthUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::Validator;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(get_me))
}

fn sign_pair(keys: &JwtKeys, user_id: uuid::Uuid) -> Result<(String, String), ApiError> {
    let access = keys.sign_access(user_id).map_err(ApiError::Internal)?;
    let refresh = keys.sign_refresh(user_id).map_err(ApiError::Internal)?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    if !state
        .rate_limiter
        .allow(&format!("register:{}", meta.rate_limit_key()))
    {
        warn!(ip = meta.rate_limit_key(), "register rate limited");
        return Err(ApiError::RateLimited);
    }

    let mut v = Validator::new();
    let email = v.require_email("email", payload.email.as_deref());
    let password = match payload.password.as_deref() {
        None => {
            v.fail("password", "password is required");
            None
        }
        Some(p) if p.len() < 8 => {
            v.fail("password", "password must be at least 8 characters");
            None
        }
        Some(p) => Some(p.to_string()),
    };
    let first_name = v.require_str("firstName", payload.first_name.as_deref(), 1, 100);
    let last_name = v.require_str("lastName", payload.last_name.as_deref(), 1, 100);
    v.finish()?;
    let (email, password) = (email.unwrap(), password.unwrap());

    if User::find_by_email(&state.db, &email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&password).map_err(ApiError::Internal)?;
    let user = User::create(
        &state.db,
        &email,
        &hash,
        &first_name.unwrap(),
        &last_name.unwrap(),
    )
    .await
    .map_err(ApiError::Internal)?;

    audit::record(
        &state.db,
        AuditEntry::new("user.register", "users")
            .actor(user.id)
            .record(user.id)
            .meta(&meta),
    )
    .await;

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = sign_pair(&keys, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::data(AuthResponse {
            access_token,
            refresh_token,
            user: user.into(),
        })),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if !state
        .rate_limiter
        .allow(&format!("login:{}", meta.rate_limit_key()))
    {
        warn!(ip = meta.rate_limit_key(), "login rate limited");
        return Err(ApiError::RateLimited);
    }

    let mut v = Validator::new();
    let email = v.require_email("email", payload.email.as_deref());
    if payload.password.is_none() {
        v.fail("password", "password is required");
    }
    v.finish()?;
    let (email, password) = (email.unwrap(), payload.password.unwrap());

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthenticated("Invalid credentials".into()));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    let ok = verify_password(&password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = sign_pair(&keys, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(ApiResponse::data(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthenticated("Invalid or expired token".into()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid or expired token".into()))?;

    let (access_token, refresh_token) = sign_pair(&keys, user.id)?;
    Ok(Json(ApiResponse::data(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })))
}

#[instrument(skip_all)]
pub async fn get_me(
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    Ok(Json(ApiResponse::data(user.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::UserRole;

    #[test]
    fn public_user_serializes_without_password_hash() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: UserRole::User,
            first_name: Some("Test".into()),
            last_name: None,
        };
        let json = serde_json::to_string(&ApiResponse::data(response)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("password"));
    }
}
