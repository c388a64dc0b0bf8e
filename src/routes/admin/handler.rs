use std::collections::HashMap;

use axum::{
    Form,
    body::Body,
    extract::{Extension, Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    AppState,
    cache::SessionCacheOperations,
    database::{UserEntity, UserRepository},
    error::{AppError, AppResult},
    policy::panel_access,
    routes::ApiPath,
    utils::{hash_password, verify_password},
};

use super::model::{
    AdminModel, LoginForm, LoginQuery, ProfileForm, ProfileQuery, SESSION_COOKIE,
    looks_like_email,
};
use super::render;

const ADMIN_HOME: &str = "/admin/";
const LOGIN_PATH: &str = "/admin/login";
const PROFILE_PATH: &str = "/admin/profile/";

/// 已登录的后台用户
#[derive(Debug, Clone)]
pub struct StaffUser(pub UserEntity);

fn login_redirect(next: &str) -> Response {
    Redirect::to(&format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next)))
    .into_response()
}

/// 只允许跳转回后台内部页面
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with("/admin") && !next.starts_with("//") => next,
        _ => ADMIN_HOME,
    }
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/admin")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

async fn current_staff(state: &AppState, jar: &CookieJar) -> AppResult<Option<UserEntity>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let Some(session) = SessionCacheOperations::get_session(state.cache.as_ref(), cookie.value()).await?
    else {
        return Ok(None);
    };

    let user = UserRepository::find_by_id(&state.pool, session.user_id).await?;
    Ok(user.filter(|u| panel_access(u.role)))
}

/// 后台访问控制，未登录或权限不足时跳转到登录页
pub async fn require_staff(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match current_staff(&state, &jar).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(StaffUser(user));
            next.run(req).await
        }
        Ok(None) => {
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| ADMIN_HOME.to_string());
            login_redirect(&target)
        }
        Err(e) => e.into_response(),
    }
}

#[axum::debug_handler]
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(render::login_page(None, query.next.as_deref()))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = query.next.as_deref();
    let found = UserRepository::find_by_username(&state.pool, form.username.trim()).await?;
    let user = match found {
        Some(user)
            if !form.password.is_empty()
                && verify_password(&form.password, &user.password_hash)? =>
        {
            user
        }
        _ => {
            tracing::warn!("Failed admin login for {}", form.username);
            let page = render::login_page(Some("Invalid username or password."), next);
            return Ok(Html(page).into_response());
        }
    };

    if !panel_access(user.role) {
        let page = render::login_page(Some("Access denied. Admin or Manager role required."), next);
        return Ok(Html(page).into_response());
    }

    // 替换已有会话
    if let Some(old) = jar.get(SESSION_COOKIE) {
        SessionCacheOperations::remove_session(state.cache.as_ref(), old.value()).await?;
    }

    let session_id = SessionCacheOperations::create_session(
        state.cache.as_ref(),
        user.id,
        state.config.session_expiration(),
    )
    .await?;

    tracing::info!("Admin login: {} ({})", user.username, user.role);

    let jar = jar.add(session_cookie(session_id));
    Ok((jar, Redirect::to(safe_next(next))).into_response())
}

#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        SessionCacheOperations::remove_session(state.cache.as_ref(), cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/admin"));
    Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
}

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(StaffUser(user)): Extension<StaffUser>,
) -> AppResult<Html<String>> {
    let dashboard = state.dashboard();
    let stats = dashboard.stats().await?;
    let chart = dashboard.chart_data().await?;
    let recent = dashboard.recent_logs().await?;

    Ok(Html(render::dashboard_page(&user, &stats, &chart, &recent)))
}

fn resolve_model(slug: &str) -> AppResult<AdminModel> {
    AdminModel::from_slug(slug).ok_or_else(|| AppError::NotFound("Page not found".into()))
}

/// 写操作失败时带错误信息重新渲染列表页
async fn render_failure(
    state: &AppState,
    user: &UserEntity,
    model: AdminModel,
    error: AppError,
) -> AppResult<Response> {
    let (status, message) = match error {
        AppError::Validation(m) => (StatusCode::BAD_REQUEST, m),
        AppError::Conflict(m) => (StatusCode::CONFLICT, m),
        AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
        other => return Err(other),
    };

    let rows = model.rows(&state.pool).await?;
    let page = render::list_page(user, model, &rows, true, Some(&message));
    Ok((status, Html(page)).into_response())
}

#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(StaffUser(user)): Extension<StaffUser>,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<Response> {
    let model = resolve_model(&slug)?;
    let policy = model.policy();
    if !policy.can_read(user.role) {
        return Ok(login_redirect(&model.list_path()));
    }

    let rows = model.rows(&state.pool).await?;
    let page = render::list_page(&user, model, &rows, policy.can_write(user.role), None);
    Ok(Html(page).into_response())
}

#[axum::debug_handler]
pub async fn create_record(
    State(state): State<AppState>,
    Extension(StaffUser(user)): Extension<StaffUser>,
    ApiPath(slug): ApiPath<String>,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let model = resolve_model(&slug)?;
    if !model.policy().can_write(user.role) {
        return Ok(login_redirect(&model.list_path()));
    }

    match model.create(&state, &form).await {
        Ok(id) => {
            tracing::info!("{} created {} #{}", user.username, model.slug(), id);
            Ok(Redirect::to(&model.list_path()).into_response())
        }
        Err(e) => render_failure(&state, &user, model, e).await,
    }
}

#[axum::debug_handler]
pub async fn edit_record(
    State(state): State<AppState>,
    Extension(StaffUser(user)): Extension<StaffUser>,
    ApiPath((slug, id)): ApiPath<(String, i64)>,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let model = resolve_model(&slug)?;
    if !model.policy().can_write(user.role) {
        return Ok(login_redirect(&model.list_path()));
    }

    match model.update(&state, id, &form).await {
        Ok(()) => {
            tracing::info!("{} updated {} #{}", user.username, model.slug(), id);
            Ok(Redirect::to(&model.list_path()).into_response())
        }
        Err(e) => render_failure(&state, &user, model, e).await,
    }
}

#[axum::debug_handler]
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(StaffUser(user)): Extension<StaffUser>,
    ApiPath((slug, id)): ApiPath<(String, i64)>,
) -> AppResult<Response> {
    let model = resolve_model(&slug)?;
    if !model.policy().can_write(user.role) {
        return Ok(login_redirect(&model.list_path()));
    }

    match model.delete(&state, id, user.id).await {
        Ok(()) => {
            tracing::info!("{} deleted {} #{}", user.username, model.slug(), id);
            Ok(Redirect::to(&model.list_path()).into_response())
        }
        Err(e) => render_failure(&state, &user, model, e).await,
    }
}

#[axum::debug_handler]
pub async fn profile_page(
    Extension(StaffUser(user)): Extension<StaffUser>,
    Query(query): Query<ProfileQuery>,
) -> Html<String> {
    let success = query
        .updated
        .is_some()
        .then_some("Profile updated successfully!");
    Html(render::profile_page(&user, None, success))
}

/// 个人资料表单校验，返回第一条错误
fn validate_profile(form: &ProfileForm) -> Option<&'static str> {
    let email = form.email.trim();
    if !email.is_empty() && !looks_like_email(email) {
        return Some("Please enter a valid email address.");
    }
    if form.current_password.is_empty() {
        return Some("Current password is required.");
    }
    if !form.new_password.is_empty() && form.new_password.chars().count() < 8 {
        return Some("Password must be at least 8 characters.");
    }
    if form.new_password != form.confirm_password {
        return Some("Passwords do not match.");
    }
    None
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(StaffUser(user)): Extension<StaffUser>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let fail = |message: &str| {
        (
            StatusCode::BAD_REQUEST,
            Html(render::profile_page(&user, Some(message), None)),
        )
            .into_response()
    };

    if let Some(message) = validate_profile(&form) {
        return Ok(fail(message));
    }

    if !verify_password(&form.current_password, &user.password_hash)? {
        return Ok(fail("Current password is incorrect."));
    }

    let email = form.email.trim();
    let email = if email.is_empty() {
        user.email.clone()
    } else {
        if UserRepository::email_taken_by_other(&state.pool, email, user.id).await? {
            return Ok(fail("This email is already used by another user."));
        }
        Some(email.to_string())
    };

    let password_hash = if form.new_password.is_empty() {
        None
    } else {
        Some(hash_password(&form.new_password, state.config.bcrypt_cost)?)
    };

    UserRepository::update_credentials(
        &state.pool,
        user.id,
        email.as_deref(),
        password_hash.as_deref(),
    )
    .await?;

    tracing::info!("{} updated their profile", user.username);
    Ok(Redirect::to(&format!("{}?updated=1", PROFILE_PATH)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, current: &str, new: &str, confirm: &str) -> ProfileForm {
        ProfileForm {
            email: email.into(),
            current_password: current.into(),
            new_password: new.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn next_must_stay_inside_admin() {
        assert_eq!(safe_next(Some("/admin/menu/")), "/admin/menu/");
        assert_eq!(safe_next(Some("https://evil.example")), ADMIN_HOME);
        assert_eq!(safe_next(Some("//evil.example")), ADMIN_HOME);
        assert_eq!(safe_next(None), ADMIN_HOME);
    }

    #[test]
    fn profile_validation_rules() {
        assert_eq!(validate_profile(&form("", "old", "", "")), None);
        assert_eq!(
            validate_profile(&form("bad", "old", "", "")),
            Some("Please enter a valid email address.")
        );
        assert_eq!(
            validate_profile(&form("", "", "", "")),
            Some("Current password is required.")
        );
        assert_eq!(
            validate_profile(&form("", "old", "short", "short")),
            Some("Password must be at least 8 characters.")
        );
        assert_eq!(
            validate_profile(&form("", "old", "longenough", "different")),
            Some("Passwords do not match.")
        );
    }
}
