//! 本地存储封装模块
//!
//! `StorageBackend` 是原始的字符串键值存储（对应浏览器的 Storage），
//! `ExpiringStorage` 在其上实现带前缀和过期时间的 JSON 缓存。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::clock::Clock;

/// 默认缓存期限（7天）
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(60 * 60 * 24 * 7);

// =========================================================
// 抽象接口
// =========================================================

/// 原始键值存储
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
    fn keys(&self) -> Vec<String>;
    fn clear(&self);
}

/// 会话持久化协作者：JSON 值 + 可选过期时间
pub trait Persistence {
    fn get(&self, key: &str) -> Option<Value>;
    /// `expire` 为 `None` 表示永不过期
    fn set(&self, key: &str, value: Value, expire: Option<Duration>);
    fn remove(&self, key: &str);
}

// =========================================================
// 内存实现
// =========================================================

/// 进程内存储，可在多个持有者之间共享
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.borrow().keys().cloned().collect()
    }

    fn clear(&self) {
        self.items.borrow_mut().clear();
    }
}

// =========================================================
// 带过期时间的存储
// =========================================================

#[derive(Serialize, Deserialize)]
struct Entry {
    value: Value,
    /// 绝对过期时间（毫秒），null 表示永不过期
    expire: Option<i64>,
}

/// 带前缀和过期时间的存储
pub struct ExpiringStorage<B: StorageBackend> {
    backend: B,
    prefix: String,
    clock: Rc<dyn Clock>,
}

impl<B: StorageBackend> ExpiringStorage<B> {
    pub fn new(backend: B, prefix: impl Into<String>, clock: Rc<dyn Clock>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            clock,
        }
    }

    /// 存储键名统一为大写
    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key).to_uppercase()
    }

    /// 使用默认期限写入
    pub fn set_default(&self, key: &str, value: Value) {
        self.set(key, value, Some(DEFAULT_CACHE_TIME));
    }

    /// 读取并反序列化为具体类型
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    /// 清空当前前缀下的所有缓存
    pub fn clear(&self) {
        let prefix = self.prefix.to_uppercase();
        for key in self.backend.keys() {
            if key.starts_with(&prefix) {
                self.backend.remove_item(&key);
            }
        }
    }

    /// 清空整个底层存储
    pub fn clear_all(&self) {
        self.backend.clear();
    }
}

impl<B: StorageBackend> Persistence for ExpiringStorage<B> {
    fn get(&self, key: &str) -> Option<Value> {
        let raw = self.backend.get_item(&self.storage_key(key))?;
        let entry: Entry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "discarding unreadable storage entry");
                return None;
            }
        };

        match entry.expire {
            Some(expire) if expire < self.clock.now().as_millis() => {
                // 已过期则删除
                self.remove(key);
                None
            }
            _ => Some(entry.value),
        }
    }

    fn set(&self, key: &str, value: Value, expire: Option<Duration>) {
        let entry = Entry {
            value,
            expire: expire.map(|d| (self.clock.now() + d).as_millis()),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self.backend.set_item(&self.storage_key(key), &raw),
            Err(e) => debug!(key, error = %e, "failed to encode storage entry"),
        }
    }

    fn remove(&self, key: &str) {
        self.backend.remove_item(&self.storage_key(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn storage(prefix: &str) -> (ExpiringStorage<MemoryStorage>, MemoryStorage, Rc<ManualClock>) {
        let backend = MemoryStorage::new();
        let clock = Rc::new(ManualClock::new(1_000_000));
        let storage = ExpiringStorage::new(backend.clone(), prefix, clock.clone());
        (storage, backend, clock)
    }

    #[test]
    fn test_keys_are_prefixed_and_uppercased() {
        let (storage, backend, _) = storage("app-");
        storage.set("auth", json!({"a": 1}), None);
        assert_eq!(backend.keys(), vec!["APP-AUTH".to_string()]);
        assert_eq!(storage.get("auth"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let (storage, backend, clock) = storage("");
        storage.set("token", json!("abc"), Some(Duration::from_secs(10)));

        clock.advance_secs(10);
        assert_eq!(storage.get("token"), Some(json!("abc")));

        clock.advance_secs(1);
        assert_eq!(storage.get("token"), None);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_default_expiry_and_never() {
        let (storage, _, clock) = storage("");
        storage.set_default("settings", json!(true));
        storage.set("forever", json!(1), None);

        clock.advance_secs(DEFAULT_CACHE_TIME.as_secs() as i64 + 1);
        assert_eq!(storage.get("settings"), None);
        assert_eq!(storage.get_as::<i32>("forever"), Some(1));
    }

    #[test]
    fn test_clear_only_touches_prefix() {
        let (storage, backend, _) = storage("app-");
        storage.set("a", json!(1), None);
        backend.set_item("OTHER", "x");

        storage.clear();
        assert_eq!(backend.keys(), vec!["OTHER".to_string()]);

        storage.clear_all();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_garbage_entry_is_ignored() {
        let (storage, backend, _) = storage("");
        backend.set_item("BROKEN", "not json");
        assert_eq!(storage.get("broken"), None);
    }
}
