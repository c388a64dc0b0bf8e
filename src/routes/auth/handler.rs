use std::time::Duration;

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState,
    database::UserRepository,
    error::{AppError, AppResult, conflict_on_unique},
    policy::Role,
    routes::{ApiJson, MessageResponse, require_payload},
    utils::{Claims, generate_token, hash_password, verify_password},
};

use super::model::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse, credentials,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let req: RegisterRequest = require_payload(body)?;
    let (username, password) = credentials(req.username, req.password)
        .ok_or_else(|| AppError::Validation("Username and password required".into()))?;

    if UserRepository::find_by_username(&state.pool, &username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let password_hash = hash_password(&password, state.config.bcrypt_cost)?;
    let user_id = UserRepository::create(&state.pool, &username, None, &password_hash, Role::User)
        .await
        .map_err(conflict_on_unique("Username already exists"))?;

    tracing::info!("Registered user {} ({})", username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user_id,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<LoginResponse>> {
    let req: LoginRequest = require_payload(body)?;
    let (username, password) = credentials(req.username, req.password)
        .ok_or_else(|| AppError::Validation("Username and password required".into()))?;

    // 用户不存在和密码错误返回同样的错误
    let user = match UserRepository::find_by_username(&state.pool, &username).await? {
        Some(user) if verify_password(&password, &user.password_hash)? => user,
        _ => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let (access_token, _) = generate_token(user.id, &state.config)?;

    Ok(Json(LoginResponse {
        access_token,
        user_id: user.id,
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<MessageResponse>> {
    state
        .revocations
        .revoke(&claims.jti, Duration::from_secs(claims.remaining_secs()))
        .await?;

    Ok(Json(MessageResponse::new("Successfully logged out")))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<MeResponse>> {
    let user = UserRepository::find_by_id(&state.pool, claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}
