use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState,
    database::{DishChanges, DishEntity, DishRepository, MenuRepository, NewDish},
    error::{AppError, AppResult},
    policy::check_owner,
    routes::{
        ApiJson, ApiPath, CreatedResponse, MessageResponse, menu::load_owned_menu, parse_payload,
        require_payload,
    },
    utils::Claims,
};

use super::model::{CreateDishRequest, DishView, UpdateDishRequest};

/// 加载菜品并通过所属菜单检查归属
async fn load_owned_dish(state: &AppState, dish_id: i64, claims: &Claims) -> AppResult<DishEntity> {
    let dish = DishRepository::find_by_id(&state.pool, dish_id)
        .await?
        .ok_or_else(|| AppError::not_found("Dish"))?;

    let owner_id = MenuRepository::find_by_id(&state.pool, dish.menu_id)
        .await?
        .and_then(|menu| menu.owner_id);
    check_owner(owner_id, claims.user_id()?)?;

    Ok(dish)
}

#[axum::debug_handler]
pub async fn list_dishes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(menu_id): ApiPath<i64>,
) -> AppResult<Json<Vec<DishView>>> {
    let menu = load_owned_menu(&state.pool, menu_id, &claims).await?;

    let mut dishes = Vec::new();
    for dish in DishRepository::list_by_menu(&state.pool, menu.id).await? {
        dishes.push(DishView::load(&state.pool, dish).await?);
    }

    Ok(Json(dishes))
}

#[axum::debug_handler]
pub async fn create_dish(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(menu_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let menu = load_owned_menu(&state.pool, menu_id, &claims).await?;
    let req: CreateDishRequest = require_payload(body)?;
    let dish = NewDish::from(req).validated()?;

    let id = DishRepository::create(&state.pool, menu.id, &dish).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Dish created",
            id,
        }),
    ))
}

#[axum::debug_handler]
pub async fn update_dish(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(dish_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<MessageResponse>> {
    let dish = load_owned_dish(&state, dish_id, &claims).await?;
    let req: UpdateDishRequest = parse_payload(body)?;
    let changes = DishChanges::from(req).validated()?;

    DishRepository::update(&state.pool, &dish, &changes).await?;
    Ok(Json(MessageResponse::new("Dish updated")))
}

#[axum::debug_handler]
pub async fn delete_dish(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(dish_id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let dish = load_owned_dish(&state, dish_id, &claims).await?;
    DishRepository::delete(&state.pool, dish.id).await?;

    Ok(Json(MessageResponse::new("Dish deleted")))
}
