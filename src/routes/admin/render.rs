// 管理后台页面渲染
// 页面很少，直接拼接 HTML，所有动态内容都经过 escape

use std::fmt::Write;

use crate::dashboard::{ChartData, DashboardStats};
use crate::database::{RequestLogEntity, UserEntity};
use crate::policy::Role;

use super::model::{AdminModel, AdminRow, Input};

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// 查询参数编码，只保留非保留字符和路径分隔符
fn layout(title: &str, user: Option<&UserEntity>, body: &str) -> String {
    let mut nav = String::new();
    if let Some(user) = user {
        nav.push_str(r#"<nav><a href="/admin/">Dashboard</a>"#);
        for model in AdminModel::ALL {
            if model.policy().can_read(user.role) {
                let _ = write!(
                    nav,
                    r#" | <a href="{}">{}</a>"#,
                    model.list_path(),
                    model.title()
                );
            }
        }
        let _ = write!(
            nav,
            r#" | <a href="/admin/profile/">Profile</a> | <a href="/admin/logout">Logout ({})</a></nav>"#,
            escape(&user.username)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - SoundFood Admin</title></head>
<body>
{nav}
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape(title),
        nav = nav,
        body = body,
    )
}

fn banner(class: &str, message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<p class="{}">{}</p>"#, class, escape(m)))
        .unwrap_or_default()
}

pub fn login_page(error: Option<&str>, next: Option<&str>) -> String {
    let action = match next {
        Some(next) => format!("/admin/login?next={}", urlencoding::encode(next)),
        None => "/admin/login".to_string(),
    };

    let body = format!(
        r#"{error}
<form method="post" action="{action}">
  <label>Username <input type="text" name="username" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Login</button>
</form>"#,
        error = banner("error", error),
        action = escape(&action),
    );

    layout("Login", None, &body)
}

pub fn dashboard_page(
    user: &UserEntity,
    stats: &DashboardStats,
    chart: &ChartData,
    recent: &[RequestLogEntity],
) -> String {
    let mut body = String::from("<h2>Statistics</h2>\n<table>\n");
    for (label, value) in [
        ("Users", stats.users),
        ("Menus", stats.menus),
        ("Dishes", stats.dishes),
        ("Emotions", stats.emotions),
        ("Textures", stats.textures),
        ("Shapes", stats.shapes),
        ("Requests", stats.requests),
    ] {
        let _ = writeln!(body, "<tr><th>{}</th><td>{}</td></tr>", label, value);
    }
    body.push_str("</table>\n<h2>Requests per day (last 30 days)</h2>\n<table class=\"chart\">\n");
    for (label, value) in chart.labels.iter().zip(&chart.values) {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(label),
            value
        );
    }
    body.push_str("</table>\n<h2>Recent activity</h2>\n<table class=\"recent\">\n");
    body.push_str("<tr><th>Time</th><th>Method</th><th>Endpoint</th><th>Status</th><th>User</th></tr>\n");
    for log in recent {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            log.timestamp.format("%Y-%m-%d %H:%M:%S"),
            escape(&log.method),
            escape(&log.endpoint),
            log.status_code,
            log.user_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    body.push_str("</table>");

    layout("Dashboard", Some(user), &body)
}

fn input_html(name: &str, input: Input, value: &str) -> String {
    match input {
        Input::Role => {
            let mut html = format!(r#"<select name="{}">"#, name);
            for role in Role::ALL {
                let selected = if role.as_str() == value { " selected" } else { "" };
                let _ = write!(
                    html,
                    r#"<option value="{0}"{1}>{0}</option>"#,
                    role.as_str(),
                    selected
                );
            }
            html.push_str("</select>");
            html
        }
        _ => {
            let kind = match input {
                Input::Email => "email",
                Input::Password => "password",
                Input::Number => "number",
                _ => "text",
            };
            format!(
                r#"<input type="{}" name="{}" value="{}">"#,
                kind,
                name,
                escape(value)
            )
        }
    }
}

pub fn list_page(
    user: &UserEntity,
    model: AdminModel,
    rows: &[AdminRow],
    can_write: bool,
    error: Option<&str>,
) -> String {
    let columns = model.columns();
    let mut body = banner("error", error);

    body.push_str("<table>\n<tr>");
    for column in &columns {
        let _ = write!(body, "<th>{}</th>", escape(column));
    }
    if can_write {
        body.push_str("<th>Actions</th>");
    }
    body.push_str("</tr>\n");

    for row in rows {
        body.push_str("<tr>");
        for cell in &row.cells {
            let _ = write!(body, "<td>{}</td>", escape(cell));
        }
        if can_write {
            let _ = write!(
                body,
                r#"<td><form method="post" action="/admin/{slug}/{id}/delete"><button type="submit">Delete</button></form></td>"#,
                slug = model.slug(),
                id = row.id,
            );
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");

    if can_write {
        for row in rows {
            let _ = write!(
                body,
                r#"<details><summary>Edit #{id}</summary><form method="post" action="/admin/{slug}/{id}/edit">"#,
                id = row.id,
                slug = model.slug(),
            );
            for field in model.fields().iter().filter(|f| f.input != Input::Password) {
                let value = row.cell(&columns, field.name);
                let _ = write!(
                    body,
                    "<label>{} {}</label>",
                    field.label,
                    input_html(field.name, field.input, value)
                );
            }
            body.push_str(r#"<button type="submit">Save</button></form></details>"#);
            body.push('\n');
        }

        let _ = write!(
            body,
            r#"<h2>Create</h2><form method="post" action="/admin/{}/new">"#,
            model.slug()
        );
        for field in model.fields() {
            let _ = write!(
                body,
                "<label>{} {}</label>",
                field.label,
                input_html(field.name, field.input, "")
            );
        }
        body.push_str(r#"<button type="submit">Create</button></form>"#);
    }

    layout(model.title(), Some(user), &body)
}

pub fn profile_page(user: &UserEntity, error: Option<&str>, success: Option<&str>) -> String {
    let body = format!(
        r#"{error}{success}
<form method="post" action="/admin/profile/">
  <label>Email <input type="email" name="email" value="{email}"></label>
  <label>Current password <input type="password" name="current_password" required></label>
  <label>New password <input type="password" name="new_password"></label>
  <label>Confirm new password <input type="password" name="confirm_password"></label>
  <button type="submit">Save changes</button>
</form>"#,
        error = banner("error", error),
        success = banner("success", success),
        email = escape(user.email.as_deref().unwrap_or("")),
    );

    layout("Profile", Some(user), &body)
}
