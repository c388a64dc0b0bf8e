use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 三种全局共享的菜品属性词表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Emotion,
    Texture,
    Shape,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 3] = [
        AttributeKind::Emotion,
        AttributeKind::Texture,
        AttributeKind::Shape,
    ];

    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Emotion => "emotions",
            AttributeKind::Texture => "textures",
            AttributeKind::Shape => "shapes",
        }
    }

    /// 与菜品的关联表
    pub fn join_table(self) -> &'static str {
        match self {
            AttributeKind::Emotion => "emotion_dish",
            AttributeKind::Texture => "texture_dish",
            AttributeKind::Shape => "shape_dish",
        }
    }

    /// 关联表中的外键列
    pub fn join_column(self) -> &'static str {
        match self {
            AttributeKind::Emotion => "emotion_id",
            AttributeKind::Texture => "texture_id",
            AttributeKind::Shape => "shape_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AttributeEntity {
    pub id: i64,
    pub description: String,
}
