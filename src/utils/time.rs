//! 时间工具

use std::time::{SystemTime, UNIX_EPOCH};

/// 获取当前 Unix 时间戳 (秒)
///
/// 系统时钟早于 1970 时返回 0.0
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
