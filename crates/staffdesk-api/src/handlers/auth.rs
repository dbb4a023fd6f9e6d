//! Auth handlers — login, register, refresh, me.

use axum::extract::{Query, State};
use axum::Json;
use validator::Validate;

use staffdesk_auth::issuer::TokenPair;
use staffdesk_core::error::{AppError, FieldErrors};

use crate::dto::request::{LoginRequest, RefreshQuery, RegisterRequest};
use crate::dto::response::{MessageResponse, UserInfoResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    req.validate().map_err(validation_error)?;

    let pair = state.issuer.login(&req.email, &req.password).await?;

    Ok(Json(pair))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    req.validate().map_err(validation_error)?;

    state
        .issuer
        .register(&req.email, &req.password, &req.employee_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "User registered successfully".to_string(),
    }))
}

/// POST /api/auth/refresh?refresh_token=...
pub async fn refresh(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.issuer.refresh(&query.refresh_token).await?;

    Ok(Json(pair))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let user = state
        .credential_store
        .find_by_email(auth.email())
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    Ok(Json(UserInfoResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        role_names: user.role_names,
    }))
}

/// Converts `validator` output into the field-keyed validation error shape.
fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    let mut fields = FieldErrors::new();

    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"))
            })
            .collect();
        fields.insert(field.to_string(), messages);
    }

    AppError::validation_fields(fields).into()
}
