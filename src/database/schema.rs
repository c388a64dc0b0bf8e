use sqlx::SqlitePool;

use crate::config::AdminBootstrap;
use crate::database::repositories::UserRepository;
use crate::policy::Role;
use crate::utils::hash_password;

pub const DEFAULT_EMOTIONS: [&str; 9] = [
    "happy",
    "sad",
    "excited",
    "calm",
    "nostalgic",
    "romantic",
    "energetic",
    "peaceful",
    "adventurous",
];

pub const DEFAULT_TEXTURES: [&str; 10] = [
    "crispy", "creamy", "crunchy", "smooth", "chewy", "tender", "flaky", "silky", "grainy",
    "velvety",
];

pub const DEFAULT_SHAPES: [&str; 9] = [
    "round",
    "square",
    "triangular",
    "irregular",
    "spiral",
    "long",
    "flat",
    "cubed",
    "cylindrical",
];

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'manager', 'admin'))
);

CREATE TABLE IF NOT EXISTS menus (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    owner_id    INTEGER REFERENCES users (id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS dishes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    menu_id     INTEGER NOT NULL REFERENCES menus (id) ON DELETE CASCADE,
    name        TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    section     TEXT NOT NULL DEFAULT '',
    bitter      INTEGER,
    salty       INTEGER,
    sour        INTEGER,
    sweet       INTEGER,
    umami       INTEGER,
    fat         INTEGER,
    piquant     INTEGER,
    temperature INTEGER,
    color1      TEXT,
    color2      TEXT,
    color3      TEXT
);

CREATE TABLE IF NOT EXISTS emotions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS textures (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS shapes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS emotion_dish (
    dish_id    INTEGER NOT NULL REFERENCES dishes (id) ON DELETE CASCADE,
    emotion_id INTEGER NOT NULL REFERENCES emotions (id) ON DELETE CASCADE,
    PRIMARY KEY (dish_id, emotion_id)
);

CREATE TABLE IF NOT EXISTS texture_dish (
    dish_id    INTEGER NOT NULL REFERENCES dishes (id) ON DELETE CASCADE,
    texture_id INTEGER NOT NULL REFERENCES textures (id) ON DELETE CASCADE,
    PRIMARY KEY (dish_id, texture_id)
);

CREATE TABLE IF NOT EXISTS shape_dish (
    dish_id  INTEGER NOT NULL REFERENCES dishes (id) ON DELETE CASCADE,
    shape_id INTEGER NOT NULL REFERENCES shapes (id) ON DELETE CASCADE,
    PRIMARY KEY (dish_id, shape_id)
);

CREATE TABLE IF NOT EXISTS request_logs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT NOT NULL,
    method      TEXT NOT NULL,
    endpoint    TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    user_id     INTEGER
);

CREATE INDEX IF NOT EXISTS idx_menus_owner ON menus (owner_id);
CREATE INDEX IF NOT EXISTS idx_dishes_menu ON dishes (menu_id);
CREATE INDEX IF NOT EXISTS idx_request_logs_timestamp ON request_logs (timestamp);
"#;

/// 创建全部数据表，可重复执行
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// 写入默认的情绪、口感和形状词表，已存在的条目会被跳过
pub async fn seed_default_attributes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let vocabularies: [(&str, &[&str]); 3] = [
        ("emotions", &DEFAULT_EMOTIONS),
        ("textures", &DEFAULT_TEXTURES),
        ("shapes", &DEFAULT_SHAPES),
    ];

    for (table, entries) in vocabularies {
        let sql = format!("INSERT OR IGNORE INTO {} (description) VALUES (?)", table);
        for description in entries {
            sqlx::query(&sql)
                .bind(*description)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    tracing::info!("Default attribute vocabularies seeded");
    Ok(())
}

/// 创建初始管理员，用户名已存在时不做任何修改
pub async fn ensure_admin_user(
    pool: &SqlitePool,
    admin: &AdminBootstrap,
    bcrypt_cost: u32,
) -> Result<bool, sqlx::Error> {
    if UserRepository::find_by_username(pool, &admin.username)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password, bcrypt_cost)
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to hash password: {}", e)))?;

    UserRepository::create(
        pool,
        &admin.username,
        admin.email.as_deref(),
        &password_hash,
        Role::Admin,
    )
    .await?;

    tracing::info!("Created admin user: {}", admin.username);
    Ok(true)
}

/// 用户表为空时需要初始化
pub async fn needs_init(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    Ok(UserRepository::count(pool).await? == 0)
}

/// 建表并在首次启动时写入初始数据，返回是否执行了初始化
pub async fn init_database(
    pool: &SqlitePool,
    admin: &AdminBootstrap,
    bcrypt_cost: u32,
) -> Result<bool, sqlx::Error> {
    init_schema(pool).await?;

    if !needs_init(pool).await? {
        tracing::info!("Database already initialized");
        return Ok(false);
    }

    tracing::info!("Initializing database");
    seed_default_attributes(pool).await?;
    ensure_admin_user(pool, admin, bcrypt_cost).await?;

    Ok(true)
}
