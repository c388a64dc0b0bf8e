use serde::Serialize;
use sqlx::FromRow;

use crate::error::AppError;

/// 菜品实体，口味强度和颜色都是可选的
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct DishEntity {
    pub id: i64,
    pub menu_id: i64,
    pub name: String,
    pub description: String,
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
}

impl DishEntity {
    /// 非空颜色，按 color1..3 的顺序
    pub fn colors(&self) -> Vec<String> {
        [&self.color1, &self.color2, &self.color3]
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect()
    }

    pub fn intensities(&self) -> [(&'static str, Option<i32>); 8] {
        [
            ("bitter", self.bitter),
            ("salty", self.salty),
            ("sour", self.sour),
            ("sweet", self.sweet),
            ("umami", self.umami),
            ("fat", self.fat),
            ("piquant", self.piquant),
            ("temperature", self.temperature),
        ]
    }
}

/// 待创建的菜品
#[derive(Debug, Clone, Default)]
pub struct NewDish {
    pub name: String,
    pub description: String,
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
    pub emotion_ids: Vec<i64>,
    pub texture_ids: Vec<i64>,
    pub shape_ids: Vec<i64>,
}

impl NewDish {
    /// 校验后的菜品，口味强度不能为负数
    pub fn validated(self) -> Result<Self, AppError> {
        check_intensities(&[
            ("bitter", self.bitter),
            ("salty", self.salty),
            ("sour", self.sour),
            ("sweet", self.sweet),
            ("umami", self.umami),
            ("fat", self.fat),
            ("piquant", self.piquant),
            ("temperature", self.temperature),
        ])?;
        Ok(self)
    }

    /// 把 NewDish 写成一条完整记录，用于插入
    pub fn to_entity(&self, menu_id: i64) -> DishEntity {
        DishEntity {
            id: 0,
            menu_id,
            name: self.name.clone(),
            description: self.description.clone(),
            section: self.section.clone(),
            bitter: self.bitter,
            salty: self.salty,
            sour: self.sour,
            sweet: self.sweet,
            umami: self.umami,
            fat: self.fat,
            piquant: self.piquant,
            temperature: self.temperature,
            color1: self.color1.clone(),
            color2: self.color2.clone(),
            color3: self.color3.clone(),
        }
    }
}

/// 菜品的部分更新
/// 外层 None 表示字段未出现在请求中，Some(None) 表示清空
#[derive(Debug, Clone, Default)]
pub struct DishChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub section: Option<String>,
    pub bitter: Option<Option<i32>>,
    pub salty: Option<Option<i32>>,
    pub sour: Option<Option<i32>>,
    pub sweet: Option<Option<i32>>,
    pub umami: Option<Option<i32>>,
    pub fat: Option<Option<i32>>,
    pub piquant: Option<Option<i32>>,
    pub temperature: Option<Option<i32>>,
    pub color1: Option<Option<String>>,
    pub color2: Option<Option<String>>,
    pub color3: Option<Option<String>>,
    pub emotion_ids: Option<Vec<i64>>,
    pub texture_ids: Option<Vec<i64>>,
    pub shape_ids: Option<Vec<i64>>,
}

impl DishChanges {
    pub fn validated(self) -> Result<Self, AppError> {
        check_intensities(&[
            ("bitter", self.bitter.flatten()),
            ("salty", self.salty.flatten()),
            ("sour", self.sour.flatten()),
            ("sweet", self.sweet.flatten()),
            ("umami", self.umami.flatten()),
            ("fat", self.fat.flatten()),
            ("piquant", self.piquant.flatten()),
            ("temperature", self.temperature.flatten()),
        ])?;
        Ok(self)
    }

    /// 把出现的字段写入已有记录
    pub fn apply(&self, dish: &mut DishEntity) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut dish.name, &self.name);
        set(&mut dish.description, &self.description);
        set(&mut dish.section, &self.section);
        set(&mut dish.bitter, &self.bitter);
        set(&mut dish.salty, &self.salty);
        set(&mut dish.sour, &self.sour);
        set(&mut dish.sweet, &self.sweet);
        set(&mut dish.umami, &self.umami);
        set(&mut dish.fat, &self.fat);
        set(&mut dish.piquant, &self.piquant);
        set(&mut dish.temperature, &self.temperature);
        set(&mut dish.color1, &self.color1);
        set(&mut dish.color2, &self.color2);
        set(&mut dish.color3, &self.color3);
    }
}

fn check_intensities(values: &[(&str, Option<i32>)]) -> Result<(), AppError> {
    for (field, value) in values {
        if value.is_some_and(|v| v < 0) {
            return Err(AppError::Validation(format!(
                "{} must be a non-negative integer",
                field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_intensity_is_rejected() {
        let dish = NewDish {
            sweet: Some(-1),
            ..NewDish::default()
        };
        let err = dish.validated().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("sweet")));
    }

    #[test]
    fn large_intensity_is_kept() {
        let dish = NewDish {
            umami: Some(1000),
            ..NewDish::default()
        }
        .validated()
        .unwrap();
        assert_eq!(dish.umami, Some(1000));
    }

    #[test]
    fn changes_only_touch_present_fields() {
        let mut dish = DishEntity {
            name: "Soup".into(),
            sweet: Some(3),
            salty: Some(2),
            color1: Some("red".into()),
            ..DishEntity::default()
        };

        DishChanges {
            name: Some("Broth".into()),
            sweet: Some(None),
            color2: Some(Some("green".into())),
            ..DishChanges::default()
        }
        .apply(&mut dish);

        assert_eq!(dish.name, "Broth");
        assert_eq!(dish.sweet, None);
        assert_eq!(dish.salty, Some(2));
        assert_eq!(dish.colors(), vec!["red".to_string(), "green".to_string()]);
    }

    #[test]
    fn empty_colors_are_skipped() {
        let dish = DishEntity {
            color1: Some(String::new()),
            color3: Some("blue".into()),
            ..DishEntity::default()
        };
        assert_eq!(dish.colors(), vec!["blue".to_string()]);
    }
}
