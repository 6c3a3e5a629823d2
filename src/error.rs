//! 错误类型
//!
//! 只在构造期 (配置 / 标签表加载) 出现；`process` 路径不返回错误

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, FusionError>;
