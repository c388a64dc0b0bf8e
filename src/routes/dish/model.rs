use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::database::{
    AttributeEntity, AttributeKind, AttributeRepository, DishChanges, DishEntity, NewDish,
};
use crate::routes::double_option;

#[derive(Debug, Deserialize)]
pub struct CreateDishRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub section: String,
    pub bitter: Option<i32>,
    pub salty: Option<i32>,
    pub sour: Option<i32>,
    pub sweet: Option<i32>,
    pub umami: Option<i32>,
    pub fat: Option<i32>,
    pub piquant: Option<i32>,
    pub temperature: Option<i32>,
    pub color1: Option<String>,
    pub color2: Option<String>,
    pub color3: Option<String>,
    #[serde(default)]
    pub emotion_ids: Vec<i64>,
    #[serde(default)]
    pub texture_ids: Vec<i64>,
    #[serde(default)]
    pub shape_ids: Vec<i64>,
}

impl From<CreateDishRequest> for NewDish {
    fn from(req: CreateDishRequest) -> Self {
        NewDish {
            name: req.name,
            description: req.description,
            section: req.section,
            bitter: req.bitter,
            salty: req.salty,
            sour: req.sour,
            sweet: req.sweet,
            umami: req.umami,
            fat: req.fat,
            piquant: req.piquant,
            temperature: req.temperature,
            color1: req.color1,
            color2: req.color2,
            color3: req.color3,
            emotion_ids: req.emotion_ids,
            texture_ids: req.texture_ids,
            shape_ids: req.shape_ids,
        }
    }
}

/// 部分更新：未出现的字段保持不变，可空字段传 null 表示清空
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDishRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub section: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bitter: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub salty: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sour: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sweet: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub umami: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fat: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub piquant: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub temperature: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color1: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color2: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color3: Option<Option<String>>,
    pub emotion_ids: Option<Vec<i64>>,
    pub texture_ids: Option<Vec<i64>>,
    pub shape_ids: Option<Vec<i64>>,
}

impl From<UpdateDishRequest> for DishChanges {
    fn from(req: UpdateDishRequest) -> Self {
        DishChanges {
            name: req.name,
            description: req.description,
            section: req.section,
            bitter: req.bitter,
            salty: req.salty,
            sour: req.sour,
            sweet: req.sweet,
            umami: req.umami,
            fat: req.fat,
            piquant: req.piquant,
            temperature: req.temperature,
            color1: req.color1,
            color2: req.color2,
            color3: req.color3,
            emotion_ids: req.emotion_ids,
            texture_ids: req.texture_ids,
            shape_ids: req.shape_ids,
        }
    }
}

/// 菜品的 API 表示
#[derive(Debug, Clone, Serialize)]
pub struct DishView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub section: String,
    pub emotions: Vec<AttributeEntity>,
    pub textures: Vec<AttributeEntity>,
    pub shapes: Vec<AttributeEntity>,
    pub bitter: Option<i32>,
    pub salty: Option<i32>,
    pub sour: Option<i32>,
    pub sweet: Option<i32>,
    pub umami: Option<i32>,
    pub fat: Option<i32>,
    pub piquant: Option<i32>,
    pub temperature: Option<i32>,
    pub colors: Vec<String>,
}

impl DishView {
    pub async fn load(pool: &SqlitePool, dish: DishEntity) -> Result<Self, sqlx::Error> {
        let emotions = AttributeRepository::for_dish(pool, AttributeKind::Emotion, dish.id).await?;
        let textures = AttributeRepository::for_dish(pool, AttributeKind::Texture, dish.id).await?;
        let shapes = AttributeRepository::for_dish(pool, AttributeKind::Shape, dish.id).await?;
        let colors = dish.colors();

        Ok(DishView {
            id: dish.id,
            name: dish.name,
            description: dish.description,
            section: dish.section,
            emotions,
            textures,
            shapes,
            bitter: dish.bitter,
            salty: dish.salty,
            sour: dish.sour,
            sweet: dish.sweet,
            umami: dish.umami,
            fat: dish.fat,
            piquant: dish.piquant,
            temperature: dish.temperature,
            colors,
        })
    }
}
