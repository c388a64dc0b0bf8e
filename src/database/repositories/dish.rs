use sqlx::{SqliteConnection, SqlitePool};

use crate::database::models::{AttributeKind, DishChanges, DishEntity, NewDish};

const DISH_COLUMNS: &str = "id, menu_id, name, description, section, bitter, salty, sour, sweet, \
                            umami, fat, piquant, temperature, color1, color2, color3";

/// 菜品存储库实现
pub struct DishRepository;

impl DishRepository {
    /// 创建菜品及其属性关联，在同一事务中完成
    pub async fn create(
        pool: &SqlitePool,
        menu_id: i64,
        dish: &NewDish,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let entity = dish.to_entity(menu_id);
        let result = sqlx::query(
            r#"
            INSERT INTO dishes (menu_id, name, description, section, bitter, salty, sour, sweet,
                                umami, fat, piquant, temperature, color1, color2, color3)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entity.menu_id)
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(&entity.section)
        .bind(entity.bitter)
        .bind(entity.salty)
        .bind(entity.sour)
        .bind(entity.sweet)
        .bind(entity.umami)
        .bind(entity.fat)
        .bind(entity.piquant)
        .bind(entity.temperature)
        .bind(&entity.color1)
        .bind(&entity.color2)
        .bind(&entity.color3)
        .execute(&mut *tx)
        .await?;

        let dish_id = result.last_insert_rowid();

        Self::set_attributes(&mut tx, dish_id, AttributeKind::Emotion, &dish.emotion_ids).await?;
        Self::set_attributes(&mut tx, dish_id, AttributeKind::Texture, &dish.texture_ids).await?;
        Self::set_attributes(&mut tx, dish_id, AttributeKind::Shape, &dish.shape_ids).await?;

        tx.commit().await?;
        Ok(dish_id)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<DishEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM dishes WHERE id = ?", DISH_COLUMNS);
        sqlx::query_as::<_, DishEntity>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_menu(
        pool: &SqlitePool,
        menu_id: i64,
    ) -> Result<Vec<DishEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM dishes WHERE menu_id = ? ORDER BY id",
            DISH_COLUMNS
        );
        sqlx::query_as::<_, DishEntity>(&sql)
            .bind(menu_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<DishEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM dishes ORDER BY id", DISH_COLUMNS);
        sqlx::query_as::<_, DishEntity>(&sql).fetch_all(pool).await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM dishes")
            .fetch_one(pool)
            .await
    }

    /// 按变更更新菜品，出现在变更中的属性列表整体替换
    pub async fn update(
        pool: &SqlitePool,
        dish: &DishEntity,
        changes: &DishChanges,
    ) -> Result<(), sqlx::Error> {
        let mut updated = dish.clone();
        changes.apply(&mut updated);

        let mut tx = pool.begin().await?;
        Self::save(&mut tx, &updated).await?;

        let lists = [
            (AttributeKind::Emotion, &changes.emotion_ids),
            (AttributeKind::Texture, &changes.texture_ids),
            (AttributeKind::Shape, &changes.shape_ids),
        ];
        for (kind, ids) in lists {
            if let Some(ids) = ids {
                Self::set_attributes(&mut tx, dish.id, kind, ids).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// 写回整条记录
    pub async fn save(conn: &mut SqliteConnection, dish: &DishEntity) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE dishes
            SET menu_id = ?, name = ?, description = ?, section = ?,
                bitter = ?, salty = ?, sour = ?, sweet = ?, umami = ?,
                fat = ?, piquant = ?, temperature = ?,
                color1 = ?, color2 = ?, color3 = ?
            WHERE id = ?
            "#,
        )
        .bind(dish.menu_id)
        .bind(&dish.name)
        .bind(&dish.description)
        .bind(&dish.section)
        .bind(dish.bitter)
        .bind(dish.salty)
        .bind(dish.sour)
        .bind(dish.sweet)
        .bind(dish.umami)
        .bind(dish.fat)
        .bind(dish.piquant)
        .bind(dish.temperature)
        .bind(&dish.color1)
        .bind(&dish.color2)
        .bind(&dish.color3)
        .bind(dish.id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for kind in AttributeKind::ALL {
            let sql = format!("DELETE FROM {} WHERE dish_id = ?", kind.join_table());
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM dishes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// 替换菜品的某一类属性，不存在的词条ID被忽略
    pub async fn set_attributes(
        conn: &mut SqliteConnection,
        dish_id: i64,
        kind: AttributeKind,
        ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE dish_id = ?", kind.join_table());
        sqlx::query(&sql).bind(dish_id).execute(&mut *conn).await?;

        let sql = format!(
            "INSERT OR IGNORE INTO {join} (dish_id, {column}) SELECT ?, id FROM {table} WHERE id = ?",
            join = kind.join_table(),
            column = kind.join_column(),
            table = kind.table(),
        );
        for id in ids {
            sqlx::query(&sql)
                .bind(dish_id)
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }
}
