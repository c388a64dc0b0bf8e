use sqlx::SqlitePool;

use crate::database::models::UserEntity;
use crate::policy::Role;

const USER_COLUMNS: &str = "id, username, email, password_hash, role";

/// 用户存储库实现
pub struct UserRepository;

impl UserRepository {
    /// 创建用户，返回新用户ID
    pub async fn create(
        pool: &SqlitePool,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: Role,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// 根据ID查找用户
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 根据用户名查找用户
    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// 邮箱是否已被其他用户使用
    pub async fn email_taken_by_other(
        pool: &SqlitePool,
        email: &str,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = ? AND id != ?)")
                .bind(email)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(taken)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        sqlx::query_as::<_, UserEntity>(&sql).fetch_all(pool).await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    /// 保存用户资料（用户名、邮箱、角色）
    pub async fn update_profile(pool: &SqlitePool, user: &UserEntity) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET username = ?, email = ?, role = ? WHERE id = ?")
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.role)
            .bind(user.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 更新邮箱，可选同时更新密码哈希
    pub async fn update_credentials(
        pool: &SqlitePool,
        user_id: i64,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET email = ?, password_hash = COALESCE(?, password_hash) WHERE id = ?",
        )
        .bind(email)
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// 删除用户，其菜单变为无主菜单
    pub async fn delete(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE menus SET owner_id = NULL WHERE owner_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
