use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;

use crate::{
    AppState,
    error::AppError,
    utils::{Claims, bearer_token, verify_token},
};

/// 校验令牌签名、有效期和撤销状态
pub async fn authenticate(state: &AppState, token: &str) -> Result<Claims, AppError> {
    let claims = verify_token(token, &state.config).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired".into()),
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    if state.revocations.is_revoked(&claims.jti).await? {
        return Err(AppError::Unauthorized("Token has been revoked".into()));
    }

    Ok(claims)
}

/// 认证中间件，通过后把 Claims 放入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".into()))?;

    let claims = authenticate(&state, &token).await?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
