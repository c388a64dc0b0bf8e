use std::collections::HashMap;

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    AppState,
    database::{
        AttributeKind, AttributeRepository, DishChanges, DishRepository, MenuEntity,
        MenuRepository, NewDish, RequestLogRepository, UserRepository,
    },
    error::{AppError, AppResult, conflict_on_unique},
    policy::{Role, ViewPolicy},
    utils::hash_password,
};

pub const SESSION_COOKIE: &str = "soundfood_session";

/// 请求日志列表最多显示的条数
const REQUEST_LOG_PAGE: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub updated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Text,
    Email,
    Password,
    Number,
    Role,
    /// 逗号分隔的ID列表
    IdList,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub input: Input,
}

const fn field(name: &'static str, label: &'static str, input: Input) -> Field {
    Field { name, label, input }
}

const USER_FIELDS: &[Field] = &[
    field("username", "Username", Input::Text),
    field("email", "Email", Input::Email),
    field("role", "Role", Input::Role),
    field("password", "Password", Input::Password),
];

const MENU_FIELDS: &[Field] = &[
    field("title", "Title", Input::Text),
    field("description", "Description", Input::Text),
    field("owner_id", "Owner ID", Input::Number),
];

const DISH_FIELDS: &[Field] = &[
    field("menu_id", "Menu ID", Input::Number),
    field("name", "Name", Input::Text),
    field("description", "Description", Input::Text),
    field("section", "Section", Input::Text),
    field("bitter", "Bitter", Input::Number),
    field("salty", "Salty", Input::Number),
    field("sour", "Sour", Input::Number),
    field("sweet", "Sweet", Input::Number),
    field("umami", "Umami", Input::Number),
    field("fat", "Fat", Input::Number),
    field("piquant", "Piquant", Input::Number),
    field("temperature", "Temperature", Input::Number),
    field("color1", "Color 1", Input::Text),
    field("color2", "Color 2", Input::Text),
    field("color3", "Color 3", Input::Text),
    field("emotion_ids", "Emotion IDs", Input::IdList),
    field("texture_ids", "Texture IDs", Input::IdList),
    field("shape_ids", "Shape IDs", Input::IdList),
];

const ATTRIBUTE_FIELDS: &[Field] = &[field("description", "Description", Input::Text)];

const REQUEST_LOG_COLUMNS: &[&str] = &[
    "id",
    "timestamp",
    "method",
    "endpoint",
    "status_code",
    "user_id",
];

/// 列表页中的一行，cells 与 columns() 一一对应
#[derive(Debug, Clone)]
pub struct AdminRow {
    pub id: i64,
    pub cells: Vec<String>,
}

impl AdminRow {
    pub fn cell(&self, columns: &[&str], name: &str) -> &str {
        columns
            .iter()
            .position(|c| *c == name)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// 管理后台可管理的模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminModel {
    User,
    Menu,
    Dish,
    Attribute(AttributeKind),
    RequestLog,
}

impl AdminModel {
    pub const ALL: [AdminModel; 7] = [
        AdminModel::User,
        AdminModel::Menu,
        AdminModel::Dish,
        AdminModel::Attribute(AttributeKind::Emotion),
        AdminModel::Attribute(AttributeKind::Texture),
        AdminModel::Attribute(AttributeKind::Shape),
        AdminModel::RequestLog,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.slug() == slug)
    }

    pub fn slug(self) -> &'static str {
        match self {
            AdminModel::User => "user",
            AdminModel::Menu => "menu",
            AdminModel::Dish => "dish",
            AdminModel::Attribute(AttributeKind::Emotion) => "emotion",
            AdminModel::Attribute(AttributeKind::Texture) => "texture",
            AdminModel::Attribute(AttributeKind::Shape) => "shape",
            AdminModel::RequestLog => "requestlog",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AdminModel::User => "Users",
            AdminModel::Menu => "Menus",
            AdminModel::Dish => "Dishes",
            AdminModel::Attribute(AttributeKind::Emotion) => "Emotions",
            AdminModel::Attribute(AttributeKind::Texture) => "Textures",
            AdminModel::Attribute(AttributeKind::Shape) => "Shapes",
            AdminModel::RequestLog => "Request Logs",
        }
    }

    pub fn policy(self) -> ViewPolicy {
        match self {
            AdminModel::User => ViewPolicy::USERS,
            AdminModel::RequestLog => ViewPolicy::REQUEST_LOGS,
            _ => ViewPolicy::CATALOG,
        }
    }

    pub fn list_path(self) -> String {
        format!("/admin/{}/", self.slug())
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            AdminModel::User => USER_FIELDS,
            AdminModel::Menu => MENU_FIELDS,
            AdminModel::Dish => DISH_FIELDS,
            AdminModel::Attribute(_) => ATTRIBUTE_FIELDS,
            AdminModel::RequestLog => &[],
        }
    }

    /// 列表列，密码不显示
    pub fn columns(self) -> Vec<&'static str> {
        if self == AdminModel::RequestLog {
            return REQUEST_LOG_COLUMNS.to_vec();
        }
        std::iter::once("id")
            .chain(
                self.fields()
                    .iter()
                    .filter(|f| f.input != Input::Password)
                    .map(|f| f.name),
            )
            .collect()
    }

    pub async fn rows(self, pool: &SqlitePool) -> Result<Vec<AdminRow>, sqlx::Error> {
        let rows = match self {
            AdminModel::User => UserRepository::list(pool)
                .await?
                .into_iter()
                .map(|u| AdminRow {
                    id: u.id,
                    cells: vec![
                        u.id.to_string(),
                        u.username,
                        u.email.unwrap_or_default(),
                        u.role.to_string(),
                    ],
                })
                .collect(),
            AdminModel::Menu => MenuRepository::list(pool)
                .await?
                .into_iter()
                .map(|m| AdminRow {
                    id: m.id,
                    cells: vec![
                        m.id.to_string(),
                        m.title,
                        m.description,
                        opt(m.owner_id),
                    ],
                })
                .collect(),
            AdminModel::Dish => {
                let mut rows = Vec::new();
                for dish in DishRepository::list(pool).await? {
                    let mut cells = vec![
                        dish.id.to_string(),
                        dish.menu_id.to_string(),
                        dish.name.clone(),
                        dish.description.clone(),
                        dish.section.clone(),
                    ];
                    cells.extend(dish.intensities().iter().map(|(_, v)| opt(*v)));
                    cells.extend(
                        [&dish.color1, &dish.color2, &dish.color3]
                            .into_iter()
                            .map(|c| c.clone().unwrap_or_default()),
                    );
                    for kind in AttributeKind::ALL {
                        let ids = AttributeRepository::for_dish(pool, kind, dish.id)
                            .await?
                            .iter()
                            .map(|a| a.id.to_string())
                            .collect::<Vec<_>>();
                        cells.push(ids.join(","));
                    }
                    rows.push(AdminRow { id: dish.id, cells });
                }
                rows
            }
            AdminModel::Attribute(kind) => AttributeRepository::list(pool, kind)
                .await?
                .into_iter()
                .map(|a| AdminRow {
                    id: a.id,
                    cells: vec![a.id.to_string(), a.description],
                })
                .collect(),
            AdminModel::RequestLog => RequestLogRepository::recent(pool, REQUEST_LOG_PAGE)
                .await?
                .into_iter()
                .map(|log| AdminRow {
                    id: log.id,
                    cells: vec![
                        log.id.to_string(),
                        log.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        log.method,
                        log.endpoint,
                        log.status_code.to_string(),
                        opt(log.user_id),
                    ],
                })
                .collect(),
        };
        Ok(rows)
    }

    /// 根据表单创建记录
    pub async fn create(self, state: &AppState, form: &HashMap<String, String>) -> AppResult<i64> {
        let form = FormData(form);
        let pool = &state.pool;

        match self {
            AdminModel::User => {
                let username = form.required("username", "Username")?;
                let password = form.required("password", "Password")?;
                let role = form.role()?;
                let password_hash = hash_password(&password, state.config.bcrypt_cost)?;
                let id = UserRepository::create(
                    pool,
                    &username,
                    form.optional_text("email").as_deref(),
                    &password_hash,
                    role,
                )
                .await
                .map_err(conflict_on_unique("Username or email already exists"))?;
                Ok(id)
            }
            AdminModel::Menu => {
                let owner_id = form.owner(pool).await?;
                Ok(MenuRepository::create(
                    pool,
                    &form.text("title"),
                    &form.text("description"),
                    owner_id,
                )
                .await?)
            }
            AdminModel::Dish => {
                let menu_id = form.menu(pool).await?;
                let dish = NewDish {
                    name: form.text("name"),
                    description: form.text("description"),
                    section: form.text("section"),
                    bitter: form.optional_int("bitter")?,
                    salty: form.optional_int("salty")?,
                    sour: form.optional_int("sour")?,
                    sweet: form.optional_int("sweet")?,
                    umami: form.optional_int("umami")?,
                    fat: form.optional_int("fat")?,
                    piquant: form.optional_int("piquant")?,
                    temperature: form.optional_int("temperature")?,
                    color1: form.optional_text("color1"),
                    color2: form.optional_text("color2"),
                    color3: form.optional_text("color3"),
                    emotion_ids: form.id_list("emotion_ids")?,
                    texture_ids: form.id_list("texture_ids")?,
                    shape_ids: form.id_list("shape_ids")?,
                }
                .validated()?;
                Ok(DishRepository::create(pool, menu_id, &dish).await?)
            }
            AdminModel::Attribute(kind) => {
                let description = form.required("description", "Description")?;
                let id = AttributeRepository::create(pool, kind, &description)
                    .await
                    .map_err(conflict_on_unique("Description already exists"))?;
                Ok(id)
            }
            AdminModel::RequestLog => Err(read_only()),
        }
    }

    /// 根据表单更新记录，用户密码不能在这里修改
    pub async fn update(
        self,
        state: &AppState,
        id: i64,
        form: &HashMap<String, String>,
    ) -> AppResult<()> {
        let form = FormData(form);
        let pool = &state.pool;

        match self {
            AdminModel::User => {
                let mut user = UserRepository::find_by_id(pool, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("User"))?;
                user.username = form.required("username", "Username")?;
                user.email = form.optional_text("email");
                user.role = form.role()?;
                UserRepository::update_profile(pool, &user)
                    .await
                    .map_err(conflict_on_unique("Username or email already exists"))?;
            }
            AdminModel::Menu => {
                MenuRepository::find_by_id(pool, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Menu"))?;
                let menu = MenuEntity {
                    id,
                    title: form.text("title"),
                    description: form.text("description"),
                    owner_id: form.owner(pool).await?,
                };
                MenuRepository::update(pool, &menu).await?;
            }
            AdminModel::Dish => {
                let mut dish = DishRepository::find_by_id(pool, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Dish"))?;
                dish.menu_id = form.menu(pool).await?;
                let changes = DishChanges {
                    name: Some(form.text("name")),
                    description: Some(form.text("description")),
                    section: Some(form.text("section")),
                    bitter: Some(form.optional_int("bitter")?),
                    salty: Some(form.optional_int("salty")?),
                    sour: Some(form.optional_int("sour")?),
                    sweet: Some(form.optional_int("sweet")?),
                    umami: Some(form.optional_int("umami")?),
                    fat: Some(form.optional_int("fat")?),
                    piquant: Some(form.optional_int("piquant")?),
                    temperature: Some(form.optional_int("temperature")?),
                    color1: Some(form.optional_text("color1")),
                    color2: Some(form.optional_text("color2")),
                    color3: Some(form.optional_text("color3")),
                    emotion_ids: Some(form.id_list("emotion_ids")?),
                    texture_ids: Some(form.id_list("texture_ids")?),
                    shape_ids: Some(form.id_list("shape_ids")?),
                }
                .validated()?;
                DishRepository::update(pool, &dish, &changes).await?;
            }
            AdminModel::Attribute(kind) => {
                let description = form.required("description", "Description")?;
                let updated = AttributeRepository::update(pool, kind, id, &description)
                    .await
                    .map_err(conflict_on_unique("Description already exists"))?;
                if !updated {
                    return Err(AppError::NotFound("Record not found".into()));
                }
            }
            AdminModel::RequestLog => return Err(read_only()),
        }

        Ok(())
    }

    /// 删除记录，不能删除自己的账号
    pub async fn delete(self, state: &AppState, id: i64, acting_user_id: i64) -> AppResult<()> {
        let pool = &state.pool;

        let deleted = match self {
            AdminModel::User => {
                if id == acting_user_id {
                    return Err(AppError::Validation(
                        "You cannot delete your own account.".into(),
                    ));
                }
                UserRepository::delete(pool, id).await?
            }
            AdminModel::Menu => MenuRepository::delete(pool, id).await?,
            AdminModel::Dish => DishRepository::delete(pool, id).await?,
            AdminModel::Attribute(kind) => AttributeRepository::delete(pool, kind, id).await?,
            AdminModel::RequestLog => return Err(read_only()),
        };

        if deleted {
            Ok(())
        } else {
            Err(AppError::NotFound("Record not found".into()))
        }
    }
}

fn read_only() -> AppError {
    AppError::Validation("Request logs are read-only.".into())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// 表单字段读取，空字符串视为未填写
struct FormData<'a>(&'a HashMap<String, String>);

impl FormData<'_> {
    fn text(&self, name: &str) -> String {
        self.0
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn optional_text(&self, name: &str) -> Option<String> {
        Some(self.text(name)).filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str, label: &str) -> AppResult<String> {
        self.optional_text(name)
            .ok_or_else(|| AppError::Validation(format!("{} is required.", label)))
    }

    fn optional_int(&self, name: &str) -> AppResult<Option<i32>> {
        self.optional_text(name)
            .map(|v| {
                v.parse::<i32>()
                    .map_err(|_| AppError::Validation(format!("{} must be an integer.", name)))
            })
            .transpose()
    }

    fn optional_id(&self, name: &str) -> AppResult<Option<i64>> {
        self.optional_text(name)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| AppError::Validation(format!("{} must be an integer.", name)))
            })
            .transpose()
    }

    fn id_list(&self, name: &str) -> AppResult<Vec<i64>> {
        self.text(name)
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    AppError::Validation(format!("{} must be a comma separated list of IDs.", name))
                })
            })
            .collect()
    }

    fn role(&self) -> AppResult<Role> {
        match self.optional_text("role") {
            Some(role) => role.parse(),
            None => Ok(Role::User),
        }
    }

    /// 可选的菜单所有者，必须是已存在的用户
    async fn owner(&self, pool: &SqlitePool) -> AppResult<Option<i64>> {
        match self.optional_id("owner_id")? {
            Some(owner_id) => {
                if UserRepository::find_by_id(pool, owner_id).await?.is_none() {
                    return Err(AppError::Validation(format!("Unknown owner: {}", owner_id)));
                }
                Ok(Some(owner_id))
            }
            None => Ok(None),
        }
    }

    /// 必填的所属菜单，必须已存在
    async fn menu(&self, pool: &SqlitePool) -> AppResult<i64> {
        let menu_id = self
            .optional_id("menu_id")?
            .ok_or_else(|| AppError::Validation("Menu ID is required.".into()))?;
        if MenuRepository::find_by_id(pool, menu_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown menu: {}", menu_id)));
        }
        Ok(menu_id)
    }
}

/// 粗略的邮箱格式检查
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !email.chars().any(char::is_whitespace)
}
