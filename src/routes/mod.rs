// 路由处理模块
// 每个业务域一个子模块，JSON 提取器和通用响应放在这里

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::AppError;

pub mod admin;
pub mod attribute;
pub mod auth;
pub mod dish;
pub mod health;
pub mod menu;

/// JSON 请求体，拒绝时返回统一的错误响应
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// 路径参数，非法ID返回 404
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: i64,
}

/// 解析请求体，null 和空对象视为没有数据
pub fn require_payload<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Err(AppError::Validation("No data provided".into()));
    }
    parse_payload(value)
}

/// 解析部分更新的请求体，允许空对象
pub fn parse_payload<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    if value.is_null() {
        return Err(AppError::Validation("No data provided".into()));
    }
    serde_json::from_value(value).map_err(|e| AppError::Validation(e.to_string()))
}

/// 区分字段缺失和显式 null：缺失为 None，null 为 Some(None)
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        sweet: Option<Option<i32>>,
    }

    #[test]
    fn missing_and_null_fields_are_distinguished() {
        let absent: Patch = parse_payload(json!({})).unwrap();
        let cleared: Patch = parse_payload(json!({ "sweet": null })).unwrap();
        let set: Patch = parse_payload(json!({ "sweet": 4 })).unwrap();

        assert_eq!(absent.sweet, None);
        assert_eq!(cleared.sweet, Some(None));
        assert_eq!(set.sweet, Some(Some(4)));
    }

    #[test]
    fn empty_payloads_are_rejected() {
        for body in [Value::Null, json!({})] {
            let err = require_payload::<Value>(body).unwrap_err();
            assert!(matches!(err, AppError::Validation(msg) if msg == "No data provided"));
        }
        assert!(require_payload::<Value>(json!({ "title": "x" })).is_ok());
    }

    #[test]
    fn wrongly_typed_fields_are_validation_errors() {
        let err = parse_payload::<Patch>(json!({ "sweet": "very" })).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
