use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    AppState,
    database::{DishRepository, MenuEntity, MenuRepository, MenuSummary},
    error::{AppError, AppResult},
    policy::check_owner,
    routes::{
        ApiJson, ApiPath, CreatedResponse, MessageResponse, dish::DishView, parse_payload,
        require_payload,
    },
    utils::Claims,
};

use super::model::{CreateMenuRequest, MenuDetail, UpdateMenuRequest};

/// 加载菜单并检查归属，先判断是否存在再判断权限
pub(crate) async fn load_owned_menu(
    pool: &SqlitePool,
    menu_id: i64,
    claims: &Claims,
) -> AppResult<MenuEntity> {
    let menu = MenuRepository::find_by_id(pool, menu_id)
        .await?
        .ok_or_else(|| AppError::not_found("Menu"))?;

    check_owner(menu.owner_id, claims.user_id()?)?;
    Ok(menu)
}

#[axum::debug_handler]
pub async fn list_menus(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<MenuSummary>>> {
    let menus = MenuRepository::list_by_owner(&state.pool, claims.user_id()?).await?;
    Ok(Json(menus))
}

#[axum::debug_handler]
pub async fn create_menu(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let req: CreateMenuRequest = require_payload(body)?;
    let id = MenuRepository::create(
        &state.pool,
        &req.title,
        &req.description,
        Some(claims.user_id()?),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Menu created",
            id,
        }),
    ))
}

#[axum::debug_handler]
pub async fn get_menu(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(menu_id): ApiPath<i64>,
) -> AppResult<Json<MenuDetail>> {
    let menu = load_owned_menu(&state.pool, menu_id, &claims).await?;

    let mut dishes = Vec::new();
    for dish in DishRepository::list_by_menu(&state.pool, menu.id).await? {
        dishes.push(DishView::load(&state.pool, dish).await?);
    }

    Ok(Json(MenuDetail {
        id: menu.id,
        title: menu.title,
        description: menu.description,
        dishes,
    }))
}

#[axum::debug_handler]
pub async fn update_menu(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(menu_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<MessageResponse>> {
    let mut menu = load_owned_menu(&state.pool, menu_id, &claims).await?;
    let req: UpdateMenuRequest = parse_payload(body)?;

    if let Some(title) = req.title.filter(|t| !t.is_empty()) {
        menu.title = title;
    }
    if let Some(description) = req.description.filter(|d| !d.is_empty()) {
        menu.description = description;
    }

    MenuRepository::update(&state.pool, &menu).await?;
    Ok(Json(MessageResponse::new("Menu updated")))
}

#[axum::debug_handler]
pub async fn delete_menu(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(menu_id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let menu = load_owned_menu(&state.pool, menu_id, &claims).await?;
    MenuRepository::delete(&state.pool, menu.id).await?;

    tracing::info!("Deleted menu {}", menu.id);
    Ok(Json(MessageResponse::new("Menu deleted")))
}
