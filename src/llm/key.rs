//! API Key 校验与来源解析
//!
//! 格式校验在任何网络调用之前完成：必须以固定前缀开头且不少于 35 个字符。
//! 来源优先级：配置中存储的 Key > 环境变量（MOLCHAT_API_KEY、OPENAI_API_KEY）。

use serde::Serialize;
use thiserror::Error;

pub const API_KEY_PREFIX: &str = "sk-";
pub const MIN_API_KEY_LEN: usize = 35;
pub const API_KEY_ENV_VARS: [&str; 2] = ["MOLCHAT_API_KEY", "OPENAI_API_KEY"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyValidationError {
    #[error("API key is empty")]
    Empty,

    #[error("API key must start with '{}'", API_KEY_PREFIX)]
    MissingPrefix,

    #[error("API key is too short ({0} characters, expected at least {})", MIN_API_KEY_LEN)]
    TooShort(usize),
}

/// Key 来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    None,
    Stored,
    Environment,
}

/// Key 状态（按需计算，不存储）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiKeyStatus {
    pub present: bool,
    pub valid: bool,
    pub source: KeySource,
}

/// 纯格式校验
pub fn validate_api_key(key: &str) -> Result<(), KeyValidationError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(KeyValidationError::Empty);
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(KeyValidationError::MissingPrefix);
    }
    let len = key.chars().count();
    if len < MIN_API_KEY_LEN {
        return Err(KeyValidationError::TooShort(len));
    }
    Ok(())
}

/// 解析实际使用的 Key 与状态；env 为环境变量读取函数（测试可替换）
pub fn resolve_api_key_with(
    stored: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> (Option<String>, ApiKeyStatus) {
    let stored = stored
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| (k.to_string(), KeySource::Stored));
    let found = stored.or_else(|| {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| env(*var))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| (k, KeySource::Environment))
    });

    match found {
        Some((key, source)) => {
            let valid = validate_api_key(&key).is_ok();
            (
                Some(key),
                ApiKeyStatus {
                    present: true,
                    valid,
                    source,
                },
            )
        }
        None => (
            None,
            ApiKeyStatus {
                present: false,
                valid: false,
                source: KeySource::None,
            },
        ),
    }
}

/// 从存储值与进程环境变量解析
pub fn resolve_api_key(stored: Option<&str>) -> (Option<String>, ApiKeyStatus) {
    resolve_api_key_with(stored, |var| std::env::var(var).ok())
}
