use sqlx::{SqliteExecutor, SqlitePool};

use crate::database::models::{AttributeEntity, AttributeKind};

/// 情绪、口感、形状词表的存储库
pub struct AttributeRepository;

impl AttributeRepository {
    pub async fn list(
        pool: &SqlitePool,
        kind: AttributeKind,
    ) -> Result<Vec<AttributeEntity>, sqlx::Error> {
        let sql = format!("SELECT id, description FROM {} ORDER BY id", kind.table());
        sqlx::query_as::<_, AttributeEntity>(&sql)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool, kind: AttributeKind) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        sqlx::query_scalar(&sql).fetch_one(pool).await
    }

    pub async fn create(
        pool: &SqlitePool,
        kind: AttributeKind,
        description: &str,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("INSERT INTO {} (description) VALUES (?)", kind.table());
        let result = sqlx::query(&sql).bind(description).execute(pool).await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(
        pool: &SqlitePool,
        kind: AttributeKind,
        id: i64,
        description: &str,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!("UPDATE {} SET description = ? WHERE id = ?", kind.table());
        let result = sqlx::query(&sql)
            .bind(description)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 删除词条及其与菜品的关联
    pub async fn delete(
        pool: &SqlitePool,
        kind: AttributeKind,
        id: i64,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            kind.join_table(),
            kind.join_column()
        );
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

        let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// 某道菜关联的词条
    pub async fn for_dish<'e, E: SqliteExecutor<'e>>(
        executor: E,
        kind: AttributeKind,
        dish_id: i64,
    ) -> Result<Vec<AttributeEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT a.id, a.description FROM {table} a \
             JOIN {join} j ON j.{column} = a.id \
             WHERE j.dish_id = ? ORDER BY a.id",
            table = kind.table(),
            join = kind.join_table(),
            column = kind.join_column(),
        );
        sqlx::query_as::<_, AttributeEntity>(&sql)
            .bind(dish_id)
            .fetch_all(executor)
            .await
    }
}
