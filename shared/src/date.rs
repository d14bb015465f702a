//! 时间类型模块
//!
//! `Timestamp`: 可序列化的毫秒时间戳，用于会话过期判断和本地存储的过期时间。

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::time::Duration;

// =========================================================
// Timestamp - 可传输的时间戳类型
// =========================================================

/// 毫秒时间戳
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 创建新的时间戳
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 系统当前时间
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    /// 获取毫秒值
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// 获取秒值
    #[inline]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// 向后偏移若干秒（负数表示向前），饱和运算
    #[inline]
    pub const fn add_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs.saturating_mul(1000)))
    }

    /// 向后偏移若干毫秒（负数表示向前），饱和运算
    #[inline]
    pub const fn add_millis(self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs.as_millis() as i64))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// 计算两个时间戳之间的差值（返回 Duration，负差值视为 0）
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let diff_ms = (self.0 - rhs.0).max(0);
        Duration::from_millis(diff_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        let ts = Timestamp::new(1_000);
        assert_eq!(ts.add_secs(2).as_millis(), 3_000);
        assert_eq!(ts.add_millis(-1).as_millis(), 999);
        assert_eq!(Timestamp::new(i64::MAX).add_secs(10).as_millis(), i64::MAX);
    }

    #[test]
    fn test_sub_is_saturating() {
        let a = Timestamp::new(5_000);
        let b = Timestamp::new(2_000);
        assert_eq!(a - b, Duration::from_secs(3));
        assert_eq!(b - a, Duration::ZERO);
    }

    #[test]
    fn test_transparent_serde() {
        let ts = Timestamp::new(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
        let back: Timestamp = serde_json::from_str("42").unwrap();
        assert_eq!(back, ts);
    }
}
