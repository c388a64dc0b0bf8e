use axum::{Json, extract::State};

use crate::{
    AppState,
    database::{AttributeEntity, AttributeKind, AttributeRepository},
    error::AppResult,
};

async fn list(state: &AppState, kind: AttributeKind) -> AppResult<Json<Vec<AttributeEntity>>> {
    Ok(Json(AttributeRepository::list(&state.pool, kind).await?))
}

#[axum::debug_handler]
pub async fn list_emotions(State(state): State<AppState>) -> AppResult<Json<Vec<AttributeEntity>>> {
    list(&state, AttributeKind::Emotion).await
}

#[axum::debug_handler]
pub async fn list_textures(State(state): State<AppState>) -> AppResult<Json<Vec<AttributeEntity>>> {
    list(&state, AttributeKind::Texture).await
}

#[axum::debug_handler]
pub async fn list_shapes(State(state): State<AppState>) -> AppResult<Json<Vec<AttributeEntity>>> {
    list(&state, AttributeKind::Shape).await
}
