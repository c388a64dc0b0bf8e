use sqlx::SqlitePool;

use crate::database::models::{AttributeKind, MenuEntity, MenuSummary};

/// 菜单存储库实现
pub struct MenuRepository;

impl MenuRepository {
    pub async fn create(
        pool: &SqlitePool,
        title: &str,
        description: &str,
        owner_id: Option<i64>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO menus (title, description, owner_id) VALUES (?, ?, ?)")
            .bind(title)
            .bind(description)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<MenuEntity>, sqlx::Error> {
        sqlx::query_as::<_, MenuEntity>(
            "SELECT id, title, description, owner_id FROM menus WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// 某个用户的菜单列表，带菜品数量
    pub async fn list_by_owner(
        pool: &SqlitePool,
        owner_id: i64,
    ) -> Result<Vec<MenuSummary>, sqlx::Error> {
        sqlx::query_as::<_, MenuSummary>(
            r#"
            SELECT m.id, m.title, m.description,
                   (SELECT COUNT(*) FROM dishes d WHERE d.menu_id = m.id) AS dish_count
            FROM menus m
            WHERE m.owner_id = ?
            ORDER BY m.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<MenuEntity>, sqlx::Error> {
        sqlx::query_as::<_, MenuEntity>(
            "SELECT id, title, description, owner_id FROM menus ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM menus")
            .fetch_one(pool)
            .await
    }

    pub async fn update(pool: &SqlitePool, menu: &MenuEntity) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE menus SET title = ?, description = ?, owner_id = ? WHERE id = ?")
            .bind(&menu.title)
            .bind(&menu.description)
            .bind(menu.owner_id)
            .bind(menu.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 删除菜单及其全部菜品和菜品属性关联
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for kind in AttributeKind::ALL {
            let sql = format!(
                "DELETE FROM {} WHERE dish_id IN (SELECT id FROM dishes WHERE menu_id = ?)",
                kind.join_table()
            );
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }

        sqlx::query("DELETE FROM dishes WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM menus WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
